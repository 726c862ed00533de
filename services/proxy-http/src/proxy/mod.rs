mod error;
pub(crate) mod handler;

pub use error::ProxyError;
pub use handler::ProxyHandler;

use crate::auth::TenantAuthenticator;
use crate::config::ProxyConfig;
use crate::downstream::DownstreamClient;
use crate::search::SearchHandler;
use std::sync::Arc;

pub const HEALTH_PATH: &str = "/health";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Process-wide collaborators, built once and shared by every request.
#[derive(Clone)]
pub struct ProxyState {
    pub authenticator: Arc<TenantAuthenticator>,
    pub search_handler: Arc<SearchHandler>,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let authenticator = Arc::new(TenantAuthenticator::new(config.tenant_header_name()?));
        let downstream = Arc::new(DownstreamClient::from_config(config)?);
        let search_handler = Arc::new(SearchHandler::new(downstream));

        Ok(Self {
            authenticator,
            search_handler,
        })
    }
}
