//! Canvas API forwarding proxy.
//!
//! Sits between a browser dashboard and a Canvas LMS instance: takes a
//! request addressed to a local path, forwards it with the caller's bearer
//! token to the upstream, and relays the upstream response.
//!
//! ```text
//!   Browser ──▶ http::server ──▶ routing (base URL, path, target)
//!                    │                         │
//!                    │                         ▼
//!   Browser ◀── http::response ◀── http::client ◀──▶ Canvas
//! ```

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
