//! This crate provides the reconciliation engine behind EKS lifecycle operations:
//! - Compound resource ID encoding and decoding
//! - Fixed-interval status polling with pending/target classification
//! - Bounded retries for transient submission errors
//! - Aggregation of nested resource issues into one error
//! - Per-key serialization of conflicting mutations
//!

mod config;
mod issues;
mod key;
mod retry;
mod serializer;
pub mod wait;

pub use config::{ConfigError, ConfigResult, LifecycleConfig, Timeouts, MAX_TIMEOUT_SECS};
pub use issues::{aggregate, Issue, IssueError, IssuesError};
pub use key::{KeyError, KeyFormat, KeyResult, DEFAULT_SEPARATOR};
pub use retry::{retry_when, RetryConfig, RetryError, DEFAULT_RETRY_DELAY, MIN_RETRY_DELAY};
pub use serializer::{lock_key, MutationSerializer};
pub use wait::{wait_for_state, Probe, StatusClass, StatusProber, WaitError, WaitSpec};

/// Cancellation handle accepted by every wait and retry loop.
pub use tokio_util::sync::CancellationToken;
