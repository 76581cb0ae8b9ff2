use clap::Args;
use gatehouse_config::StoreConfig;

#[derive(Args, Debug, Clone)]
pub(crate) struct Init {
    /// Write the store section with username uniqueness enforced
    #[arg(long)]
    pub(crate) enforce_unique_usernames: Option<bool>,
}

impl Init {
    pub(crate) fn store_overrides(&self) -> Option<StoreConfig> {
        self.enforce_unique_usernames
            .map(|enforce_unique_usernames| StoreConfig {
                enforce_unique_usernames,
            })
    }
}
