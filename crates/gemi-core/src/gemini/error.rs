use thiserror::Error;

/// User-facing category of a failed generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Invalid API key. Please check your Gemini API key in settings.")]
    InvalidApiKey,

    #[error("API quota exceeded. Please try again later.")]
    QuotaExceeded,

    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    /// Anything unrecognized, carrying the upstream message verbatim
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Categorize an upstream failure message.
    ///
    /// Checks run in order. The uppercase API codes match case-sensitively while
    /// the prose patterns match in any case.
    #[must_use]
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if message.contains("API_KEY_INVALID") || lower.contains("invalid api key") {
            Self::InvalidApiKey
        } else if lower.contains("quota") {
            Self::QuotaExceeded
        } else if message.contains("RATE_LIMIT") || lower.contains("rate limit") {
            Self::RateLimited
        } else {
            Self::Other(message)
        }
    }

    /// Text shown in the launcher, e.g. `Error: API quota exceeded. ...`
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("Error: {self}")
    }
}
