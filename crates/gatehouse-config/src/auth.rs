use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::Config;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
    /// Number of shards of the account lock table
    #[serde(default = "default_lock_shards")]
    pub lock_shards: usize,
    /// Capacity of the request channel of the auth service
    #[serde(default = "default_command_channel_capacity")]
    pub command_channel_capacity: usize,
    /// Message pushed to the session after a successful login
    #[serde(default = "default_login_greeting")]
    pub login_greeting: String,
    /// Source label recorded for registrations that don't carry one
    #[serde(default = "default_register_source")]
    pub default_register_source: String,
}

const fn default_lock_shards() -> usize {
    2048
}

const fn default_command_channel_capacity() -> usize {
    1024
}

fn default_login_greeting() -> String {
    "Hello Gatehouse".to_string()
}

fn default_register_source() -> String {
    "user-registration".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            lock_shards: default_lock_shards(),
            command_channel_capacity: default_command_channel_capacity(),
            login_greeting: default_login_greeting(),
            default_register_source: default_register_source(),
        }
    }
}

impl Config for AuthConfig {
    type Output = AuthConfig;

    fn load_context(figment: Figment) -> Result<Self::Output, figment::Error> {
        figment.extract()
    }

    fn profile() -> String {
        "auth".to_string()
    }
}
