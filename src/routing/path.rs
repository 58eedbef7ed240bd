//! Extraction of the upstream-relative path from an inbound URI.
//!
//! Three deployment styles are supported:
//! - `wildcard`: `/api/proxy/api/v1/courses?x=1` → `api/v1/courses`, `x=1`
//! - `query`: `/api/proxy?path=api&path=v1&path=courses&x=1` → `api/v1/courses`, `x=1`
//! - `raw`: `/api/v1/courses?x=1` with `strip_prefix = ""` → `api/v1/courses`, `x=1`
//!
//! The extracted path is taken as-is; an API version prefix is the caller's
//! responsibility.

use axum::http::Uri;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;

use crate::config::{PathSource, RoutingConfig};

/// Bytes that may not appear literally in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Upstream-relative path and the query string to forward with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    /// Path without a leading slash. Never empty.
    pub path: String,
    /// Query string without the leading `?`. Never empty when present.
    pub query: Option<String>,
}

/// Path extraction strategy compiled from `RoutingConfig`.
#[derive(Debug, Clone)]
pub struct PathExtractor {
    source: PathSource,
    mount_path: String,
    query_param: String,
    strip_prefix: String,
}

impl PathExtractor {
    pub fn new(
        source: PathSource,
        mount_path: impl Into<String>,
        query_param: impl Into<String>,
        strip_prefix: impl Into<String>,
    ) -> Self {
        Self {
            source,
            mount_path: trim_trailing(mount_path.into()),
            query_param: query_param.into(),
            strip_prefix: trim_trailing(strip_prefix.into()),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(
            config.path_source,
            config.mount_path.clone(),
            config.query_param.clone(),
            config.strip_prefix.clone(),
        )
    }

    pub fn source(&self) -> PathSource {
        self.source
    }

    /// Mount path without a trailing slash; empty when mounted at root.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Returns `None` when no non-empty path can be extracted.
    pub fn extract(&self, uri: &Uri) -> Option<TargetPath> {
        match self.source {
            PathSource::Wildcard => {
                let tail = strip_segment_prefix(uri.path(), &self.mount_path)?;
                target(tail, uri.query())
            }
            PathSource::Raw => {
                let tail = strip_segment_prefix(uri.path(), &self.strip_prefix)?;
                target(tail, uri.query())
            }
            PathSource::Query => self.extract_from_query(uri.query()?),
        }
    }

    fn extract_from_query(&self, query: &str) -> Option<TargetPath> {
        let mut segments = Vec::new();
        let mut rest = Vec::new();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match form_urlencoded::parse(pair.as_bytes()).next() {
                Some((key, value)) if key == self.query_param.as_str() => {
                    // Decoded values are re-encoded per segment so a `#` or
                    // `?` stays inside the path.
                    segments.extend(
                        value
                            .split('/')
                            .filter(|segment| !segment.is_empty())
                            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string()),
                    );
                }
                // Other parameters are forwarded byte-for-byte.
                _ => rest.push(pair),
            }
        }

        let path = segments.join("/");
        if path.is_empty() {
            return None;
        }
        let query = (!rest.is_empty()).then(|| rest.join("&"));
        Some(TargetPath { path, query })
    }
}

fn trim_trailing(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}

/// Strip `prefix` from `path` on a segment boundary.
fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let tail = path.strip_prefix(prefix)?;
    if tail.is_empty() || tail.starts_with('/') {
        Some(tail)
    } else {
        None
    }
}

fn target(tail: &str, query: Option<&str>) -> Option<TargetPath> {
    let path = tail.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(TargetPath {
        path: path.to_string(),
        query: query.filter(|q| !q.is_empty()).map(str::to_string),
    })
}
