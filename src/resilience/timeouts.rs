//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls and inbound body reads with a deadline
//! - Report how long the call ran before it was abandoned
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out upstream calls return 504 Gateway Timeout; a body that
//!   arrives too late returns 408

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;

/// The wrapped future did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {limit:?} elapsed after {elapsed:?}")]
pub struct DeadlineElapsed {
    pub limit: Duration,
    pub elapsed: Duration,
}

/// Run `fut` to completion or until `limit` passes, whichever is first.
/// The future is dropped (and its connection with it) on expiry.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineElapsed {
            limit,
            elapsed: started.elapsed(),
        })
}
