use thiserror::Error;

/// Errors that can occur while searching, fetching or persisting recipes
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure talking to a provider or the backend
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider daily quota exhausted (HTTP 402). Kept distinct from the
    /// generic transport failure so callers can show the "daily limit
    /// exceeded" message instead of the generic one.
    #[error("API quota exceeded: daily limit reached")]
    QuotaExceeded,

    /// Provider answered with a non-success status other than quota
    #[error("Provider returned status {0}")]
    Status(u16),

    /// Search invoked with a blank query or ingredient list
    #[error("Empty search query")]
    EmptyQuery,

    /// No provider API key in configuration or environment
    #[error("API key not found in config or environment")]
    MissingApiKey,

    /// Payload did not match the expected provider schema
    #[error("Failed to decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend rejected the request (auth, validation, missing resource)
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FetchError {
    /// Whether this error is the provider-quota condition, which gets its
    /// own user-facing message.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, FetchError::QuotaExceeded)
    }
}
