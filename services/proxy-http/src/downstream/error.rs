use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("Downstream service unavailable: {0}")]
    Unavailable(String),

    #[error("Downstream transport error: {0}")]
    Transport(String),

    #[error("Invalid downstream target: {0}")]
    InvalidTarget(String),
}

impl From<reqwest::Error> for DownstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            DownstreamError::Unavailable(err.to_string())
        } else {
            DownstreamError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for DownstreamError {
    fn from(err: url::ParseError) -> Self {
        DownstreamError::InvalidTarget(err.to_string())
    }
}

impl DownstreamError {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            DownstreamError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DownstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
            DownstreamError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
