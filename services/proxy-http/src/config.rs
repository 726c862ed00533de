use anyhow::{Context, Result};
use http::HeaderName;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TENANT_HEADER: &str = "x-auth-organization";
pub const DEFAULT_DOWNSTREAM_URL: &str = "http://localhost:8080";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 150;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listen host address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Base URL of the downstream workflow service
    pub downstream_url: String,

    /// Header carrying the caller's tenant identifier
    pub tenant_header: String,

    /// Downstream connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Downstream read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Run the accept loop on the calling task instead of spawning it
    pub blocking: bool,

    /// Log level
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            downstream_url: DEFAULT_DOWNSTREAM_URL.to_string(),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            blocking: true,
            log_level: "info".to_string(),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("PROXY_HOST").unwrap_or(defaults.host);

        let port = match lookup("PROXY_PORT") {
            Some(raw) => raw.parse().context("Invalid PROXY_PORT")?,
            None => defaults.port,
        };

        let downstream_url = lookup("DOWNSTREAM_URL").unwrap_or(defaults.downstream_url);

        let tenant_header = lookup("TENANT_HEADER").unwrap_or(defaults.tenant_header);

        let connect_timeout_ms = match lookup("CONNECT_TIMEOUT_MS") {
            Some(raw) => raw.parse().context("Invalid CONNECT_TIMEOUT_MS")?,
            None => defaults.connect_timeout_ms,
        };

        let read_timeout_ms = match lookup("READ_TIMEOUT_MS") {
            Some(raw) => raw.parse().context("Invalid READ_TIMEOUT_MS")?,
            None => defaults.read_timeout_ms,
        };

        let blocking = match lookup("PROXY_BLOCKING") {
            Some(raw) => raw.parse().context("Invalid PROXY_BLOCKING")?,
            None => defaults.blocking,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            host,
            port,
            downstream_url,
            tenant_header,
            connect_timeout_ms,
            read_timeout_ms,
            blocking,
            log_level,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.downstream_url.is_empty() {
            anyhow::bail!("DOWNSTREAM_URL cannot be empty");
        }

        let url = Url::parse(&self.downstream_url)
            .with_context(|| format!("Invalid DOWNSTREAM_URL: {}", self.downstream_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("DOWNSTREAM_URL must use http or https, got {}", url.scheme());
        }
        if url.query().is_some() {
            anyhow::bail!("DOWNSTREAM_URL must not carry a query string");
        }

        self.tenant_header_name()?;

        if self.connect_timeout_ms == 0 {
            anyhow::bail!("CONNECT_TIMEOUT_MS must be greater than 0");
        }

        if self.read_timeout_ms == 0 {
            anyhow::bail!("READ_TIMEOUT_MS must be greater than 0");
        }

        Ok(())
    }

    /// Parsed tenant header name
    pub fn tenant_header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.tenant_header.trim().as_bytes())
            .with_context(|| format!("Invalid TENANT_HEADER: {:?}", self.tenant_header))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
