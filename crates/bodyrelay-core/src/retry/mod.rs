//! Fixed-count retry policy for chunk delivery.
//!
//! Failures are retried in place, with no delay, until the per-chunk attempt
//! budget runs out. Internal faults are never retried.

mod classify;
mod error;
mod policy;

pub use classify::{check_status, classify, is_success};
pub use error::ChunkError;
pub use policy::{FailureKind, RetryDecision, RetryPolicy};
