use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Empty universe: {0}")]
    EmptyUniverse(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        FolioError::SerializationError(e.to_string())
    }
}
