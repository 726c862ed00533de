use super::{SearchError, SearchRequest, QUERY_PARAM};
use crate::auth::TenantContext;
use crate::body::ProxyBody;
use crate::downstream::{DownstreamClient, QueryParams};
use http::{Method, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Rewrites workflow searches so they only ever match the bound tenant, then
/// relays the downstream reply without buffering it.
pub struct SearchHandler {
    downstream: Arc<DownstreamClient>,
}

impl SearchHandler {
    pub fn new(downstream: Arc<DownstreamClient>) -> Self {
        Self { downstream }
    }

    #[instrument(skip(self, inbound), fields(tenant_id))]
    pub async fn handle(
        &self,
        method: Method,
        path: &str,
        inbound: &QueryParams,
    ) -> Result<Response<ProxyBody>, SearchError> {
        let tenant = TenantContext::current()?;
        tracing::Span::current().record("tenant_id", tenant.as_str());

        let request = SearchRequest::from_params(inbound)?;
        let scoped = request.scoped_query(&tenant);

        let mut params = DownstreamClient::copy_parameters(inbound);
        params.set(QUERY_PARAM, scoped.as_str());

        debug!(
            start = request.start,
            size = request.size,
            free_text = %request.free_text,
            query = %scoped,
            "Scoped search query"
        );

        let downstream = self.downstream.execute(method, path, &params).await?;
        let status = downstream.status();

        if is_failure(status) {
            warn!(status = status.as_u16(), "Downstream rejected search");
            return Err(SearchError::DownstreamStatus(status));
        }

        let headers = downstream.headers().clone();
        let mut response = Response::new(downstream.into_body());
        *response.status_mut() = status;
        response.headers_mut().extend(headers);

        Ok(response)
    }
}

/// Every status from 400 up, including the non-standard 6xx-9xx range.
fn is_failure(status: StatusCode) -> bool {
    status.as_u16() >= 400
}
