//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (CANVAS_BASE_URL / CANVAS_PROXY_BIND overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no hot reload
//! - All fields have defaults to allow minimal configs
//! - A missing upstream base URL is reported per request (500), not at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, parse_config, ConfigError};
pub use schema::{
    HostSource, ListenerConfig, ObservabilityConfig, PathSource, ProxyConfig, RoutingConfig,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
