use crate::auth::AuthError;
use crate::body::{self, ProxyBody};
use crate::downstream::DownstreamError;
use crate::search::SearchError;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Response, StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("No route for path {0}")]
    NotFound(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
}

impl ProxyError {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            ProxyError::Auth(e) if e.is_client_error() => StatusCode::UNAUTHORIZED,
            ProxyError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Search(e) => e.to_status_code(),
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ProxyError::Auth(AuthError::HeaderMissing(_) | AuthError::InvalidTenant) => {
                "AUTH_HEADER_MISSING"
            }
            ProxyError::Auth(_) | ProxyError::Search(SearchError::Tenant(_)) => "INTERNAL_ERROR",
            ProxyError::Search(
                SearchError::InvalidParameter { .. } | SearchError::InvalidEncoding(_),
            ) => "INVALID_PARAMETER",
            ProxyError::Search(SearchError::DownstreamStatus(_)) => "DOWNSTREAM_ERROR",
            ProxyError::Search(SearchError::Downstream(e)) => match e {
                DownstreamError::Unavailable(_) => "DOWNSTREAM_UNAVAILABLE",
                DownstreamError::Transport(_) => "DOWNSTREAM_TRANSPORT_ERROR",
                DownstreamError::InvalidTarget(_) => "INTERNAL_ERROR",
            },
            ProxyError::NotFound(_) => "NOT_FOUND",
            ProxyError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
        }
    }

    pub fn to_response(&self, request_id: Option<&str>) -> Response<ProxyBody> {
        let body_json = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "request_id": request_id,
        });

        let mut response = Response::new(body::full(body_json.to_string()));
        *response.status_mut() = self.to_status_code();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
