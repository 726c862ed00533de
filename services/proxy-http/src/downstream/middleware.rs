use super::DownstreamError;
use http::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Identity of a single forwarded request, as seen by client middleware.
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub method: Method,
    pub url: Url,
}

/// Hook around every outbound call made by [`super::DownstreamClient`].
pub trait ClientMiddleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_request(&self, _call: &OutboundCall) {}

    fn on_response(&self, _call: &OutboundCall, _status: StatusCode, _latency: Duration) {}

    fn on_error(&self, _call: &OutboundCall, _error: &DownstreamError, _latency: Duration) {}
}

/// Fixed middleware chain, assembled once when the client is built.
#[derive(Clone)]
pub struct MiddlewareChain {
    layers: Arc<[Arc<dyn ClientMiddleware>]>,
}

impl MiddlewareChain {
    pub fn new(layers: Vec<Arc<dyn ClientMiddleware>>) -> Self {
        Self {
            layers: layers.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    pub(crate) fn before(&self, call: &OutboundCall) {
        for layer in self.layers.iter() {
            layer.on_request(call);
        }
    }

    pub(crate) fn after(&self, call: &OutboundCall, status: StatusCode, latency: Duration) {
        for layer in self.layers.iter().rev() {
            layer.on_response(call, status, latency);
        }
    }

    pub(crate) fn failed(&self, call: &OutboundCall, error: &DownstreamError, latency: Duration) {
        for layer in self.layers.iter().rev() {
            layer.on_error(call, error, latency);
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new(vec![Arc::new(RequestLogging)])
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Logs every forwarded request with its outcome and latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogging;

impl ClientMiddleware for RequestLogging {
    fn name(&self) -> &'static str {
        "request-logging"
    }

    fn on_request(&self, call: &OutboundCall) {
        debug!(method = %call.method, url = %call.url, "Forwarding request downstream");
    }

    fn on_response(&self, call: &OutboundCall, status: StatusCode, latency: Duration) {
        info!(
            method = %call.method,
            path = %call.url.path(),
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Downstream response received"
        );
    }

    fn on_error(&self, call: &OutboundCall, error: &DownstreamError, latency: Duration) {
        warn!(
            method = %call.method,
            path = %call.url.path(),
            error = %error,
            latency_ms = latency.as_millis(),
            "Downstream call failed"
        );
    }
}
