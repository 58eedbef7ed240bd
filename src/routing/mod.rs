//! Routing subsystem: where a request goes upstream.
//!
//! # Data Flow
//! ```text
//! Inbound Request (headers, uri)
//!     → resolver.rs (base URL from config or X-Canvas-Host)
//!     → path.rs (upstream-relative path + query)
//!     → target.rs (absolute upstream URL)
//! ```
//!
//! # Design Decisions
//! - Strategies compiled from config at startup, immutable at runtime
//! - Deterministic: same (base URL, path, query) always yields the same URL
//! - The proxy is path-transparent; it never adds an API version prefix

pub mod path;
pub mod resolver;
pub mod target;

pub use path::{PathExtractor, TargetPath};
pub use resolver::{
    resolver_from_config, BaseUrl, BaseUrlError, ConfigResolver, HeaderResolver, UpstreamResolver,
};
pub use target::build_target_url;
