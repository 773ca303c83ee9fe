use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Teacher '{id}' not found")]
    TeacherNotFound { id: String },

    #[error("Invalid price: {value} (must be a finite number >= 0)")]
    InvalidPrice { value: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
