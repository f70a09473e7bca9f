//! Error types for the financial chat assistant pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Classification error: {0}")]
    ClassificationError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Lexicon error: {0}")]
    LexiconError(String),

    #[error("Dispatch error: {0}")]
    DispatchError(String),

    // =============================
    // Collaborator Domain Errors
    // =============================

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
