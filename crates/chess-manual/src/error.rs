//! Game record error types

use thiserror::Error;
use xiangqi_core::CoreError;

#[derive(Error, Debug)]
pub enum ManualError {
    #[error("Not an XQF file: bad signature")]
    BadSignature,

    #[error("XQF key checksum mismatch")]
    BadChecksum,

    #[error("Unsupported XQF version: {0}")]
    UnsupportedVersion(u8),

    #[error("Truncated record: {0}")]
    Truncated(&'static str),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("{0} cannot be written")]
    ReadOnly(&'static str),

    #[error("Board error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ManualError>;
