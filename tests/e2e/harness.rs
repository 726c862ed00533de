#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::info;
use wiremock::MockServer;
use workflow_proxy_http::config::ProxyConfig;
use workflow_proxy_http::server::{ProxyServer, RunningServer};

pub const TENANT_HEADER: &str = "x-auth-organization";
pub const SEARCH_PATH: &str = "/workflow/search";

/// One proxy instance wired to its own mock workflow service.
pub struct TestHarness {
    downstream: MockServer,
    proxy: Option<RunningServer>,
    client: Client,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    /// Starts the proxy after letting the caller adjust its configuration.
    /// The downstream URL defaults to the harness mock server.
    pub async fn with_config<F>(customize: F) -> Result<Self>
    where
        F: FnOnce(&mut ProxyConfig),
    {
        let downstream = MockServer::start().await;

        let mut config = ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            downstream_url: downstream.uri(),
            log_level: "warn".to_string(),
            ..ProxyConfig::default()
        };
        customize(&mut config);
        config.validate().context("harness proxy config")?;

        let proxy = ProxyServer::new(config)
            .context("constructing proxy")?
            .start()
            .await
            .context("starting proxy")?;
        info!(proxy = %proxy.local_addr(), downstream = %downstream.uri(), "Harness ready");

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("building harness client")?;

        Ok(Self {
            downstream,
            proxy: Some(proxy),
            client,
        })
    }

    pub fn downstream(&self) -> &MockServer {
        &self.downstream
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    pub fn proxy_url(&self, path: &str) -> String {
        let base = self
            .proxy
            .as_ref()
            .map(RunningServer::base_url)
            .unwrap_or_default();
        format!("{}{}", base, path)
    }

    /// Issues a search as `tenant`, or unauthenticated when `tenant` is `None`.
    pub async fn search(&self, tenant: Option<&str>, params: &[(&str, &str)]) -> Result<Response> {
        let mut request = self.client.get(self.proxy_url(SEARCH_PATH)).query(params);
        if let Some(tenant) = tenant {
            request = request.header(TENANT_HEADER, tenant);
        }
        request.send().await.context("search request")
    }

    /// Every `query` value the mock workflow service has received so far.
    pub async fn forwarded_queries(&self) -> Vec<String> {
        self.forwarded_param("query").await
    }

    pub async fn forwarded_param(&self, name: &str) -> Vec<String> {
        self.downstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .flat_map(|r| {
                r.url
                    .query_pairs()
                    .filter(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub async fn shutdown(mut self) -> Result<()> {
        match self.proxy.take() {
            Some(proxy) => proxy.shutdown().await,
            None => Ok(()),
        }
    }
}

pub fn random_tenant_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

pub fn find_free_port() -> Result<u16> {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .context("binding to ephemeral port")?
        .local_addr()
        .context("reading ephemeral port")?
        .port();
    Ok(port)
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}
