use super::AuthError;
use std::fmt;
use std::future::Future;
use tracing::{debug, trace};

tokio::task_local! {
    static CURRENT_TENANT: TenantId;
}

/// Validated, non-blank tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    /// Trims surrounding whitespace and rejects blank values.
    ///
    /// Single quotes, backslashes and control characters are rejected as
    /// well: the id is embedded verbatim inside a quoted literal of the
    /// downstream query.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AuthError> {
        let trimmed = raw.as_ref().trim();
        let forbidden = |c: char| matches!(c, '\'' | '\\') || c.is_control();
        if trimmed.is_empty() || trimmed.chars().any(forbidden) {
            return Err(AuthError::InvalidTenant);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request-scoped tenant binding.
///
/// The binding lives in a tokio task-local, so it travels with the request's
/// future rather than with the worker thread polling it. It exists only while
/// the scoped future is being polled and is released when that future
/// completes, fails, panics or is dropped.
pub struct TenantContext;

impl TenantContext {
    /// Validates `raw` and runs `fut` with the resulting tenant bound.
    pub async fn bind<F>(raw: &str, fut: F) -> Result<F::Output, AuthError>
    where
        F: Future,
    {
        let tenant = TenantId::new(raw)?;
        Self::scope(tenant, fut).await
    }

    /// Runs `fut` with `tenant` bound. Nested bindings are rejected.
    pub async fn scope<F>(tenant: TenantId, fut: F) -> Result<F::Output, AuthError>
    where
        F: Future,
    {
        if Self::is_bound() {
            return Err(AuthError::AlreadyBound);
        }

        debug!(tenant_id = %tenant, "Tenant bound");
        let _release = Release(tenant.clone());

        Ok(CURRENT_TENANT.scope(tenant, fut).await)
    }

    /// Tenant bound to the in-flight request.
    pub fn current() -> Result<TenantId, AuthError> {
        CURRENT_TENANT
            .try_with(TenantId::clone)
            .map_err(|_| AuthError::NoTenantBound)
    }

    pub fn is_bound() -> bool {
        CURRENT_TENANT.try_with(|_| ()).is_ok()
    }
}

struct Release(TenantId);

impl Drop for Release {
    fn drop(&mut self) {
        trace!(tenant_id = %self.0, "Tenant binding released");
    }
}
