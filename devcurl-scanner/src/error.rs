use devcurl_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Storage error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
