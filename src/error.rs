use thiserror::Error;

#[derive(Debug, Error)]
pub enum GearingError {
    #[error("property {property}: {field} {reason}")]
    InvalidParameter {
        property: usize,
        field: &'static str,
        reason: String,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GearingError>;
