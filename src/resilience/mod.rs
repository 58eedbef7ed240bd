//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound body:
//!     → timeouts.rs (remaining inbound budget)
//!     → elapsed: 408
//! Request to upstream:
//!     → timeouts.rs (deadline over send + body buffering)
//!     → elapsed: 504, other failure: 500
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - No retries: a failed upstream call is reported, never replayed

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineElapsed};
