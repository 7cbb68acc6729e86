use thiserror::Error;

/// Errors surfaced by the AnimeFLV client.
///
/// Callers only ever see three kinds: bad credentials, a network problem,
/// or anything else. Setup forms map them to validation messages; a refresh
/// cycle aborts on any of them.
#[derive(Debug, Error)]
pub enum FlvError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("communication error: {0}")]
    Communication(String),

    #[error("API error: {0}")]
    Api(String),
}

impl FlvError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication(_))
    }
}

impl From<reqwest::Error> for FlvError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            Self::Communication(e.to_string())
        } else {
            Self::Api(e.to_string())
        }
    }
}

/// Failure to pull a value out of a scraped page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("marker `{0}` not found")]
    MissingMarker(String),

    #[error("assignment `{0}` has no terminating `;`")]
    Unterminated(String),

    #[error("invalid value for `{name}`: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("malformed list item #{index}: {reason}")]
    MalformedItem { index: usize, reason: String },
}

impl From<ScrapeError> for FlvError {
    fn from(e: ScrapeError) -> Self {
        Self::Api(e.to_string())
    }
}
