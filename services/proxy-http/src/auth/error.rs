use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or blank tenant header: {0}")]
    HeaderMissing(String),

    #[error("Tenant ID must not be empty or contain quotes, backslashes or control characters")]
    InvalidTenant,

    #[error("No tenant bound to the current request")]
    NoTenantBound,

    #[error("A tenant is already bound to the current request")]
    AlreadyBound,
}

impl AuthError {
    /// Whether the failure is attributable to the caller rather than to wiring
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::HeaderMissing(_) | AuthError::InvalidTenant)
    }
}
