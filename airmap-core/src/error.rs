use thiserror::Error;

/// Rejected coordinate input. No request is made for these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude and longitude must be valid numbers.")]
    NotANumber,

    #[error("Latitude must be between -90 and 90.")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be between -180 and 180.")]
    LongitudeOutOfRange(f64),
}

/// Failure of a single report fetch.
///
/// Every variant is terminal for the click that produced it; a new
/// submission is the only way to try again once the retry policy gives up.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),

    #[error("HTTP {status}{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Http { status: u16, detail: Option<String> },

    #[error("Request timed out.")]
    Timeout,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transport failures, timeouts, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Transport(_) => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 429,
            FetchError::InvalidCoordinates(_) | FetchError::Decode(_) => false,
        }
    }

    /// Whether the failure happened before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Transport(_))
    }
}
