//! Proxy configuration.

use mailchimp_core::upstream::{UpstreamBase, DEFAULT_BASE_TEMPLATE};

/// Where the proxy listens and which upstream it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Upstream base URL with a `{dc}` placeholder for the data center.
    pub upstream: UpstreamBase,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            upstream: UpstreamBase::default(),
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `HOST`, `PORT` and `MAILCHIMP_BASE_URL`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let template = std::env::var("MAILCHIMP_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_TEMPLATE.to_string());
        Self {
            host,
            port,
            upstream: UpstreamBase::new(&template),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn upstream_template(mut self, template: &str) -> Self {
        self.upstream = UpstreamBase::new(template);
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
