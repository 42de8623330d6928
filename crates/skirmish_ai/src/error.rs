//! Error types for the decision engine.
//!
//! Almost everything that can go wrong during a decision pass is a
//! transient no-op, not an error: those are expressed as
//! [`crate::stage::StageOutcome::Idle`] and a debug log. `AiError` covers
//! the genuinely exceptional cases, all of them configuration-shaped.

use thiserror::Error;

/// Result type alias using [`AiError`].
pub type Result<T> = std::result::Result<T, AiError>;

/// Top-level error type for controller construction and configuration.
#[derive(Debug, Error)]
pub enum AiError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a RON configuration document.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// A doctrine value is outside its legal range.
    #[error("Invalid doctrine value for {field}: {message}")]
    InvalidDoctrine {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}
