use thiserror::Error;

/// Error taxonomy for the retrieval-chat pipeline.
///
/// `Config` surfaces while a session is being built and is fatal.
/// `Provider` and `Storage` surface at answer time and propagate to the
/// caller unmodified; nothing in this crate retries or falls back.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        SessionError::Config(err.to_string())
    }

    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        SessionError::Provider(err.to_string())
    }

    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        SessionError::Storage(err.to_string())
    }
}
