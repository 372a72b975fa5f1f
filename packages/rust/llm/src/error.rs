use bidflow_shared::BidFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: retry after {retry_after:?}s")]
    RateLimitExceeded { retry_after: Option<u64> },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } | Self::NetworkError(_) | Self::Timeout => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::AuthenticationError(_) | Self::MalformedResponse(_) | Self::InvalidRequest(_) => {
                false
            }
        }
    }
}

impl From<LlmError> for BidFlowError {
    fn from(e: LlmError) -> Self {
        BidFlowError::ModelBackend(e.to_string())
    }
}
