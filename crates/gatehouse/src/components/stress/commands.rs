use clap::Args;
use serde::Serialize;

/// Fires concurrent registrations and logins at an in-memory service
#[derive(Args, Debug, Clone)]
pub(crate) struct Stress {
    /// Number of distinct usernames
    #[arg(long, default_value_t = 100)]
    pub(crate) users: usize,

    /// Concurrent registrations per username
    #[arg(long, default_value_t = 8)]
    pub(crate) contenders: usize,

    /// Logins per username once registration settled, every other one with a
    /// wrong password
    #[arg(long, default_value_t = 0)]
    pub(crate) logins: usize,

    #[command(flatten)]
    pub(crate) auth: AuthOverrides,

    #[command(flatten)]
    pub(crate) store: StoreOverrides,
}

#[derive(Args, Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct AuthOverrides {
    /// Number of shards of the account lock table
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lock_shards: Option<usize>,
}

#[derive(Args, Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct StoreOverrides {
    /// Reject duplicate usernames at the store level
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enforce_unique_usernames: Option<bool>,
}
