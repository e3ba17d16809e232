//! Error types for the sand field

use thiserror::Error;

/// Main error type for the crate.
///
/// Only construction and configuration paths produce errors. Runtime
/// conditions such as pool exhaustion or a missed terrain probe are handled
/// locally and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
