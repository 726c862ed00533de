use super::{ProxyError, ProxyState, HEALTH_PATH, REQUEST_ID_HEADER};
use crate::body::{self, ProxyBody};
use crate::config::ProxyConfig;
use crate::downstream::QueryParams;
use crate::search::{SearchError, SEARCH_PATH};
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Response};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub struct ProxyHandler {
    state: ProxyState,
}

impl ProxyHandler {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let state = ProxyState::new(config)?;
        Ok(Self { state })
    }

    /// Full request pipeline. Every failure is turned into a response here,
    /// so the connection itself never sees a service error.
    #[instrument(
        skip(self, req),
        fields(request_id, method = %req.method(), path = %req.uri().path())
    )]
    pub async fn handle_request<B>(&self, req: Request<B>) -> Response<ProxyBody> {
        let start = Instant::now();
        let (parts, _) = req.into_parts();

        let request_id = request_id_for(&parts.headers);
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut response = match self.dispatch(&parts).await {
            Ok(response) => response,
            Err(e) => {
                let status = e.to_status_code();
                if status.is_server_error() {
                    error!(error = %e, status = status.as_u16(), "Request failed");
                } else {
                    warn!(error = %e, status = status.as_u16(), "Request rejected");
                }
                e.to_response(Some(&request_id))
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        info!(
            status = response.status().as_u16(),
            total_latency_ms = start.elapsed().as_millis(),
            "Request completed"
        );

        response
    }

    async fn dispatch(&self, parts: &Parts) -> Result<Response<ProxyBody>, ProxyError> {
        if parts.method == Method::GET && parts.uri.path() == HEALTH_PATH {
            return Ok(health_response());
        }

        self.state
            .authenticator
            .authenticate(&parts.headers, self.route(parts))
            .await?
    }

    async fn route(&self, parts: &Parts) -> Result<Response<ProxyBody>, ProxyError> {
        let path = parts.uri.path();
        if path != SEARCH_PATH {
            return Err(ProxyError::NotFound(path.to_string()));
        }
        if parts.method != Method::GET {
            return Err(ProxyError::MethodNotAllowed(parts.method.clone()));
        }

        let inbound = QueryParams::parse(parts.uri.query()).map_err(SearchError::from)?;
        debug!(params = inbound.len(), "Routing workflow search");

        let response = self
            .state
            .search_handler
            .handle(parts.method.clone(), path, &inbound)
            .await?;

        Ok(response)
    }
}

/// Reuses a caller-supplied request id, otherwise mints a fresh one.
fn request_id_for(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn health_response() -> Response<ProxyBody> {
    let mut response = Response::new(body::full(json!({ "status": "ok" }).to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
