use thiserror::Error;

/// Hard failures. Everything else degrades to a fallback value plus a diagnostic.
#[derive(Debug, Error)]
pub enum AccessorError {
    // A `__function:` step names something nobody registered
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    // A registered function gave up
    #[error("function `{name}` failed: {message}")]
    Function { name: String, message: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AccessorError>;
