//! Error types for waits

use std::time::Duration;

use thiserror::Error;

use crate::issues::IssuesError;

/// Boxed error returned by a status prober.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a wait ended without reaching its target.
///
/// Variants that observed the resource keep the last snapshot so callers can
/// extract richer diagnostics than the status alone.
#[derive(Debug, Error)]
pub enum WaitError<S> {
    /// The prober returned an error. Probe errors are never retried.
    #[error("{0}")]
    Probe(#[source] BoxError),

    /// The resource reached a status that is neither pending nor target.
    #[error(
        "unexpected state '{state}', wanted target '{}'{}",
        .target.join(", "),
        last_error_suffix(.last_error.as_ref())
    )]
    UnexpectedState {
        state: String,
        target: Vec<String>,
        snapshot: Box<S>,
        #[source]
        last_error: Option<IssuesError>,
    },

    /// The deadline elapsed while the resource was still pending.
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{last_state}', timeout: {timeout:?}){}",
        .target.join(", "),
        last_error_suffix(.last_error.as_ref())
    )]
    Timeout {
        last_state: String,
        target: Vec<String>,
        timeout: Duration,
        snapshot: Option<Box<S>>,
        #[source]
        last_error: Option<IssuesError>,
    },

    /// The resource stayed absent for more probes than the wait tolerates.
    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: u32 },

    /// The caller cancelled the wait.
    #[error("wait cancelled")]
    Cancelled,
}

fn last_error_suffix(last_error: Option<&IssuesError>) -> String {
    last_error.map_or_else(String::new, |err| format!(". last error: {err}"))
}

impl<S> WaitError<S> {
    /// The last snapshot observed before the wait failed, if any.
    pub fn snapshot(&self) -> Option<&S> {
        match self {
            Self::UnexpectedState { snapshot, .. } => Some(&**snapshot),
            Self::Timeout { snapshot, .. } => snapshot.as_deref(),
            Self::Probe(_) | Self::NotFound { .. } | Self::Cancelled => None,
        }
    }

    pub fn into_snapshot(self) -> Option<S> {
        match self {
            Self::UnexpectedState { snapshot, .. } => Some(*snapshot),
            Self::Timeout { snapshot, .. } => snapshot.map(|s| *s),
            Self::Probe(_) | Self::NotFound { .. } | Self::Cancelled => None,
        }
    }

    /// Convert the carried snapshot, keeping the classification and diagnostics.
    pub fn map_snapshot<T>(self, f: impl FnOnce(S) -> T) -> WaitError<T> {
        match self {
            Self::Probe(err) => WaitError::Probe(err),
            Self::UnexpectedState {
                state,
                target,
                snapshot,
                last_error,
            } => WaitError::UnexpectedState {
                state,
                target,
                snapshot: Box::new(f(*snapshot)),
                last_error,
            },
            Self::Timeout {
                last_state,
                target,
                timeout,
                snapshot,
                last_error,
            } => WaitError::Timeout {
                last_state,
                target,
                timeout,
                snapshot: snapshot.map(|s| Box::new(f(*s))),
                last_error,
            },
            Self::NotFound { checks } => WaitError::NotFound { checks },
            Self::Cancelled => WaitError::Cancelled,
        }
    }

    /// Aggregated diagnostics attached to the failure.
    pub fn last_error(&self) -> Option<&IssuesError> {
        match self {
            Self::UnexpectedState { last_error, .. } | Self::Timeout { last_error, .. } => {
                last_error.as_ref()
            }
            Self::Probe(_) | Self::NotFound { .. } | Self::Cancelled => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The resource reached an explicit failure state.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::UnexpectedState { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::{aggregate, Issue};

    #[test]
    fn test_unexpected_state_message_includes_last_error() {
        let err: WaitError<&str> = WaitError::UnexpectedState {
            state: "CREATE_FAILED".to_string(),
            target: vec!["ACTIVE".to_string()],
            snapshot: Box::new("addon"),
            last_error: aggregate([Some(
                Issue::new("ConfigurationConflict", "conflicts").with_resource_ids(["aws-node"]),
            )]),
        };

        assert_eq!(
            err.to_string(),
            "unexpected state 'CREATE_FAILED', wanted target 'ACTIVE'. last error: aws-node: ConfigurationConflict: conflicts"
        );
        assert!(err.is_terminal_failure());
        assert_eq!(err.snapshot(), Some(&"addon"));
    }

    #[test]
    fn test_timeout_message() {
        let err: WaitError<()> = WaitError::Timeout {
            last_state: "CREATING".to_string(),
            target: vec!["ACTIVE".to_string()],
            timeout: Duration::from_secs(20),
            snapshot: None,
            last_error: None,
        };

        assert_eq!(
            err.to_string(),
            "timeout while waiting for state to become 'ACTIVE' (last state: 'CREATING', timeout: 20s)"
        );
        assert!(err.is_timeout());
        assert!(err.into_snapshot().is_none());
    }

    #[test]
    fn test_map_snapshot_keeps_diagnostics() {
        let err: WaitError<u32> = WaitError::Timeout {
            last_state: "CREATING".to_string(),
            target: vec!["ACTIVE".to_string()],
            timeout: Duration::from_secs(20),
            snapshot: Some(Box::new(3)),
            last_error: aggregate([Some(Issue::new("E1", "m1"))]),
        };

        let mapped = err.map_snapshot(|n| format!("snapshot-{n}"));

        assert!(mapped.is_timeout());
        assert_eq!(mapped.snapshot().map(String::as_str), Some("snapshot-3"));
        assert_eq!(mapped.last_error().unwrap().to_string(), "E1: m1");
    }
}
