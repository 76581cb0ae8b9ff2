use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Unable to serialize configuration: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Config file {0} already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}
