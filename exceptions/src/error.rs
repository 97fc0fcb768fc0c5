use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(#[from] envconfig::Error),
    #[error("Invalid serialized exception: {0}")]
    DeserializeError(#[from] serde_json::Error),
}
