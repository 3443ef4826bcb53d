use thiserror::Error;

use crate::models::RecordKind;

/// Structural fault in one input record. Excluded from matching, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} '{record_id}': {reason}")]
pub struct MalformedRecord {
    pub kind: RecordKind,
    pub record_id: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(kind: RecordKind, record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: record_id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("malformed record: {0}")]
    Malformed(#[from] MalformedRecord),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worker failed: {0}")]
    Worker(String),
}

pub type Result<T, E = ReconError> = std::result::Result<T, E>;
