//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID, method, credential, body)
//!     → [routing resolves base URL, path, target]
//!     → client.rs (upstream call under deadline)
//!     → response.rs (relay status, headers, body)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{ForwardRequest, UpstreamClient};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{relay, UpstreamResponse, STRIPPED_RESPONSE_HEADERS};
pub use server::{AppState, HttpServer, HEALTH_PATH};
