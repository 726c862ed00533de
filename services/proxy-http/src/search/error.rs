use crate::auth::AuthError;
use crate::downstream::{DownstreamError, InvalidEncoding};
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Tenant context unavailable: {0}")]
    Tenant(#[from] AuthError),

    #[error("Invalid value for parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error(transparent)]
    InvalidEncoding(#[from] InvalidEncoding),

    #[error("Downstream responded with status {0}")]
    DownstreamStatus(StatusCode),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl SearchError {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            // The handler only runs behind the authenticator, so a missing
            // binding here is a wiring fault rather than a caller mistake.
            SearchError::Tenant(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::InvalidParameter { .. } | SearchError::InvalidEncoding(_) => {
                StatusCode::BAD_REQUEST
            }
            SearchError::DownstreamStatus(status) => *status,
            SearchError::Downstream(e) => e.to_status_code(),
        }
    }
}
