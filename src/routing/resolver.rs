//! Upstream base URL resolution.
//!
//! # Responsibilities
//! - Validate and normalize base URLs (`scheme://host[:port][/prefix]`)
//! - Resolve the base URL for one request from config or from a header
//!
//! # Design Decisions
//! - Resolution is a strategy behind `UpstreamResolver`; the handler never
//!   knows which source is in use
//! - Missing server config is an operator fault (500); a missing or bad
//!   caller header is a caller fault (400)

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;
use url::Url;

use crate::config::{HostSource, UpstreamConfig};
use crate::error::ProxyError;

const DEFAULT_HOST_HEADER: &str = "x-canvas-host";

/// Reasons a string is not a usable base URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseUrlError {
    #[error("'{0}' is not an absolute URL")]
    Malformed(String),
    #[error("'{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("'{0}' has no host")]
    MissingHost(String),
    #[error("'{0}' must not carry a query or fragment")]
    QueryOrFragment(String),
}

/// Normalized upstream base URL without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Parse and normalize a base URL.
    ///
    /// Scheme and host are lowercased, default ports dropped, and trailing
    /// slashes removed, so `HTTPS://H.example.com:443/` and
    /// `https://h.example.com` compare equal.
    pub fn parse(raw: &str) -> Result<Self, BaseUrlError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|_| BaseUrlError::Malformed(raw.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BaseUrlError::UnsupportedScheme(raw.to_string()));
        }
        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(BaseUrlError::MissingHost(raw.to_string())),
        };
        if url.query().is_some() || url.fragment().is_some() {
            return Err(BaseUrlError::QueryOrFragment(raw.to_string()));
        }

        let mut normalized = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            normalized.push_str(&format!(":{port}"));
        }
        normalized.push_str(url.path().trim_end_matches('/'));

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy producing the upstream base URL for one inbound request.
pub trait UpstreamResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, headers: &HeaderMap) -> Result<BaseUrl, ProxyError>;
}

/// Base URL fixed by trusted server configuration.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    base_url: Option<BaseUrl>,
}

impl ConfigResolver {
    pub fn new(base_url: Option<BaseUrl>) -> Self {
        Self { base_url }
    }

    /// Build from the raw config value. Blank or unparseable values leave
    /// the resolver unconfigured, which surfaces as 500 per request.
    pub fn from_setting(raw: Option<&str>) -> Self {
        let base_url = raw
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match BaseUrl::parse(raw) {
                Ok(base) => Some(base),
                Err(e) => {
                    tracing::error!(error = %e, "Ignoring invalid upstream base URL");
                    None
                }
            });
        Self { base_url }
    }

    pub fn base_url(&self) -> Option<&BaseUrl> {
        self.base_url.as_ref()
    }
}

impl UpstreamResolver for ConfigResolver {
    fn resolve(&self, _headers: &HeaderMap) -> Result<BaseUrl, ProxyError> {
        self.base_url.clone().ok_or(ProxyError::Configuration)
    }
}

/// Base URL supplied by the caller in a header such as `X-Canvas-Host`.
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    header: HeaderName,
    allowed: Vec<BaseUrl>,
}

impl HeaderResolver {
    pub fn new(header: HeaderName) -> Self {
        Self {
            header,
            allowed: Vec::new(),
        }
    }

    /// Restrict callers to the given base URLs. An empty list allows any.
    pub fn with_allowed_hosts(mut self, allowed: Vec<BaseUrl>) -> Self {
        self.allowed = allowed;
        self
    }
}

impl UpstreamResolver for HeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<BaseUrl, ProxyError> {
        let header = self.header.as_str();
        let value = match headers.get(&self.header) {
            Some(value) => value.to_str().map_err(|_| ProxyError::InvalidHost {
                header: header.to_string(),
                reason: "not valid UTF-8".to_string(),
            })?,
            None => "",
        };

        let value = value.trim();
        if value.is_empty() {
            return Err(ProxyError::MissingHost {
                header: header.to_string(),
            });
        }

        let base = BaseUrl::parse(value).map_err(|e| ProxyError::InvalidHost {
            header: header.to_string(),
            reason: e.to_string(),
        })?;

        if !self.allowed.is_empty() && !self.allowed.contains(&base) {
            return Err(ProxyError::HostNotAllowed {
                header: header.to_string(),
                host: base.to_string(),
            });
        }

        Ok(base)
    }
}

/// Build the resolver selected by `upstream.host_source`.
pub fn resolver_from_config(config: &UpstreamConfig) -> Arc<dyn UpstreamResolver> {
    match config.host_source {
        HostSource::Config => Arc::new(ConfigResolver::from_setting(config.base_url.as_deref())),
        HostSource::Header => {
            let header = HeaderName::from_bytes(config.host_header.as_bytes())
                .unwrap_or_else(|_| HeaderName::from_static(DEFAULT_HOST_HEADER));
            let allowed = config
                .allowed_hosts
                .iter()
                .filter_map(|host| match BaseUrl::parse(host) {
                    Ok(base) => Some(base),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping invalid allowed host");
                        None
                    }
                })
                .collect();
            Arc::new(HeaderResolver::new(header).with_allowed_hosts(allowed))
        }
    }
}
