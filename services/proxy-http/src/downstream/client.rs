use super::{params, DownstreamError, MiddlewareChain, OutboundCall, QueryParams};
use crate::body::{self, ProxyBody};
use crate::config::ProxyConfig;
use anyhow::Context;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::instrument;
use url::Url;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Outbound side of the proxy.
///
/// The `reqwest` client, its timeouts and the middleware chain are fixed at
/// construction; every request reuses them and nothing per-request is stored
/// on the client.
pub struct DownstreamClient {
    http_client: Client,
    base_url: String,
    middleware: MiddlewareChain,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl DownstreamClient {
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Self::with_middleware(
            base_url,
            connect_timeout,
            read_timeout,
            MiddlewareChain::default(),
        )
    }

    pub fn with_middleware(
        base_url: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
        middleware: MiddlewareChain,
    ) -> anyhow::Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid downstream URL: {}", base_url))?;

        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .pool_max_idle_per_host(20)
            .build()
            .context("Failed to build downstream HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            middleware,
            connect_timeout,
            read_timeout,
        })
    }

    pub fn from_config(config: &ProxyConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.downstream_url,
            config.connect_timeout(),
            config.read_timeout(),
        )
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Upper bound on the wait for response headers.
    pub fn response_deadline(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }

    /// Independent copy of the inbound parameters, safe to rewrite.
    pub fn copy_parameters(inbound: &QueryParams) -> QueryParams {
        params::copy_parameters(inbound)
    }

    pub fn target_url(&self, path: &str, params: &QueryParams) -> Result<Url, DownstreamError> {
        if !path.starts_with('/') {
            return Err(DownstreamError::InvalidTarget(format!(
                "path must be absolute: {}",
                path
            )));
        }

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&params.to_query_string()));
        }
        Ok(url)
    }

    /// Performs exactly one outbound attempt and returns once response
    /// headers have arrived; the body is left unread for streaming.
    #[instrument(skip(self, params), fields(method = %method, path = %path))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
    ) -> Result<DownstreamResponse, DownstreamError> {
        let url = self.target_url(path, params)?;
        let call = OutboundCall {
            method: method.clone(),
            url: url.clone(),
        };

        let request = self
            .http_client
            .request(method, url)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .build()?;

        self.middleware.before(&call);
        let start = Instant::now();
        let deadline = self.response_deadline();

        let outcome = match tokio::time::timeout(deadline, self.http_client.execute(request)).await
        {
            Ok(result) => result.map_err(DownstreamError::from),
            Err(_) => Err(DownstreamError::Unavailable(format!(
                "no response within {} ms",
                deadline.as_millis()
            ))),
        };
        let latency = start.elapsed();

        match outcome {
            Ok(response) => {
                self.middleware.after(&call, response.status(), latency);
                Ok(DownstreamResponse::from_reqwest(response))
            }
            Err(e) => {
                self.middleware.failed(&call, &e, latency);
                Err(e)
            }
        }
    }
}

/// Status, minimal headers and the still-unread body of a downstream reply.
#[derive(Debug)]
pub struct DownstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    content_length: Option<u64>,
    inner: reqwest::Response,
}

impl DownstreamResponse {
    fn from_reqwest(response: reqwest::Response) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, content_type.clone());
        }

        Self {
            status: response.status(),
            headers,
            content_length: response.content_length(),
            inner: response,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_body(&self) -> bool {
        self.status != StatusCode::NO_CONTENT && self.content_length != Some(0)
    }

    pub fn into_body(self) -> ProxyBody {
        if self.has_body() {
            body::from_stream(self.inner.bytes_stream())
        } else {
            body::empty()
        }
    }
}
