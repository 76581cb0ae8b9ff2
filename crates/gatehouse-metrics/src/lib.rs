use prometheus::{self, Encoder, Registry, TextEncoder};

use lazy_static::lazy_static;

mod auth;

#[cfg(test)]
mod tests;

pub use auth::*;

lazy_static! {
    pub static ref GATEHOUSE_METRIC_REGISTRY: Registry =
        Registry::new_custom(Some("gatehouse".to_string()), None).unwrap();
}

/// Encodes every registered metric in the prometheus text format.
pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let metric_families = GATEHOUSE_METRIC_REGISTRY.gather();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}
