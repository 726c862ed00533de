use super::{AuthError, TenantContext, TenantId};
use http::{HeaderMap, HeaderName};
use std::future::Future;
use tracing::{debug, warn};

/// Binds the tenant named by a trusted header around the next pipeline stage.
///
/// Authentication itself happens upstream; this only reads the header the
/// upstream authenticator sets and refuses requests that lack it.
#[derive(Debug, Clone)]
pub struct TenantAuthenticator {
    header: HeaderName,
}

impl TenantAuthenticator {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn extract(&self, headers: &HeaderMap) -> Result<TenantId, AuthError> {
        let missing = || AuthError::HeaderMissing(self.header.to_string());

        let raw = headers
            .get(&self.header)
            .ok_or_else(missing)?
            .to_str()
            .map_err(|_| missing())?;

        TenantId::new(raw).map_err(|e| match e {
            AuthError::InvalidTenant if raw.trim().is_empty() => missing(),
            other => other,
        })
    }

    /// Runs `next` with the request's tenant bound, releasing it afterwards on
    /// every exit path. `next` is never polled when the header is unusable.
    pub fn authenticate<F>(
        &self,
        headers: &HeaderMap,
        next: F,
    ) -> impl Future<Output = Result<F::Output, AuthError>>
    where
        F: Future,
    {
        let extracted = self.extract(headers);
        let header = self.header.clone();

        async move {
            let tenant = match extracted {
                Ok(tenant) => tenant,
                Err(e) => {
                    warn!(header = %header, error = %e, "Rejecting request without usable tenant");
                    return Err(e);
                }
            };

            debug!(tenant_id = %tenant, "Request authenticated");
            TenantContext::scope(tenant, next).await
        }
    }
}
