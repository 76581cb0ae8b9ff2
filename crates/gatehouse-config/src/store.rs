use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::Config;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Reject a second account with the same username at the store level
    #[serde(default)]
    pub enforce_unique_usernames: bool,
}

impl Config for StoreConfig {
    type Output = StoreConfig;

    fn load_context(figment: Figment) -> Result<Self::Output, figment::Error> {
        figment.extract()
    }

    fn profile() -> String {
        "store".to_string()
    }
}
