//! Error types for Crosspost

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosspostError>;

#[derive(Error, Debug)]
pub enum CrosspostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Destination error: {0}")]
    Destination(#[from] DestinationError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone)]
pub enum DestinationError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Submission validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl CrosspostError {
    /// True for login-gate failures, which callers usually surface differently
    /// from transport or destination-side errors.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            CrosspostError::Destination(DestinationError::Authentication(_))
        )
    }
}
