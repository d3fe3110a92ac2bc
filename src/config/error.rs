use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    FileLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{key} was not provided during startup (field '{field}')")]
    MissingRequired { field: String, key: String },

    #[error("failed to convert value '{value}' of key '{key}' for field '{field}': {reason}")]
    Conversion {
        field: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("no built-in coercion or registered adapter for type {type_name} (field '{field}')")]
    NoAdapter { field: String, type_name: &'static str },
}

impl ConfigError {
    /// Name of the schema field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::FileLoad { .. } => None,
            ConfigError::MissingRequired { field, .. }
            | ConfigError::Conversion { field, .. }
            | ConfigError::NoAdapter { field, .. } => Some(field),
        }
    }
}
