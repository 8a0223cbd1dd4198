use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoticeError {
    #[error("Invalid notice payload: {0}")]
    InvalidArgument(String),

    #[error("Invalid time value `{0}`: it could not be converted to a timestamp")]
    InvalidTimeValue(String),

    #[error("Notice {hash} is corrupted: {reason}")]
    CorruptedRecord { hash: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl NoticeError {
    pub fn corrupted(hash: impl Into<String>, reason: impl Into<String>) -> Self {
        NoticeError::CorruptedRecord {
            hash: hash.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that belong to a single stored record.
    pub fn is_corruption(&self) -> bool {
        matches!(self, NoticeError::CorruptedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, NoticeError>;
