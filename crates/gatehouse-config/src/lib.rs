//! Configuration of the gatehouse services.
//!
//! Every section is loaded the same way: serde defaults first, then the
//! matching table of `$GATEHOUSE_HOME/config.toml`, then `GATEHOUSE_<SECTION>_*`
//! environment variables, then command line overrides.

pub mod auth;
pub mod error;
pub mod store;

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub use auth::AuthConfig;
pub use error::ConfigError;
pub use store::StoreConfig;

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub trait Config: Serialize {
    /// The configuration type returned (should be Self).
    type Output;

    /// Return the profile name of the configuration, which is also the name
    /// of its table in the config file.
    fn profile() -> String;

    /// Layer the config file and the environment on top of `figment`.
    /// The home is the directory where `config.toml` is located.
    fn load_from_file(figment: Figment, home: &Path) -> Figment {
        let profile = Self::profile();
        let env_prefix = format!("GATEHOUSE_{}_", profile.to_uppercase());

        let section = Figment::new()
            .merge(Toml::file(home.join(CONFIG_FILE_NAME)).nested())
            .merge(
                Env::prefixed(&env_prefix)
                    .map(|key| key.as_str().replace('_', "-").into())
                    .profile(profile.as_str()),
            )
            .select(profile.as_str());

        figment.merge(section)
    }

    /// Try to extract the configuration from the figment context.
    fn load_context(figment: Figment) -> Result<Self::Output, figment::Error>;

    /// Convert the configuration to a TOML table.
    fn to_toml(&self) -> Result<toml::Table, toml::ser::Error> {
        toml::Table::try_from(self)
    }

    /// Load the configuration from the file, the environment and the command
    /// line (if any), in that order of precedence.
    fn load<S: Serialize>(home: &Path, command: Option<S>) -> Result<Self::Output, figment::Error> {
        let mut figment = Figment::new();

        figment = Self::load_from_file(figment, home);

        if let Some(command) = command {
            figment = figment.merge(Serialized::from(command, Self::profile()))
        }

        Self::load_context(figment)
    }
}

/// Every section of the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GatehouseConfig {
    pub auth: AuthConfig,
    pub store: StoreConfig,
}

impl GatehouseConfig {
    pub fn load<A: Serialize, S: Serialize>(
        home: &Path,
        auth_overrides: Option<A>,
        store_overrides: Option<S>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            auth: AuthConfig::load(home, auth_overrides)?,
            store: StoreConfig::load(home, store_overrides)?,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut table = toml::Table::new();

        insert_into_toml(&mut table, &self.auth)?;
        insert_into_toml(&mut table, &self.store)?;

        Ok(toml::to_string(&table)?)
    }

    /// Write the configuration to `home/config.toml`, refusing to overwrite an
    /// existing file.
    pub fn write_to(&self, home: &Path) -> Result<PathBuf, ConfigError> {
        let path = home.join(CONFIG_FILE_NAME);

        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.display().to_string()));
        }

        std::fs::create_dir_all(home)?;
        std::fs::write(&path, self.to_toml()?)?;

        Ok(path)
    }
}

/// Insert `config` as its own table, named after its profile.
pub fn insert_into_toml<T: Config>(
    config_toml: &mut toml::Table,
    config: &T,
) -> Result<(), toml::ser::Error> {
    config_toml.insert(T::profile(), toml::Value::Table(config.to_toml()?));

    Ok(())
}
