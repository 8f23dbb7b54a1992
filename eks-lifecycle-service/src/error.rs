use std::fmt;

use eks_lifecycle_core::{ConfigError, KeyError, WaitError};
use thiserror::Error;

use crate::aws::{ApiError, AwsError};
use crate::probers::Snapshot;

/// The lifecycle step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn gerund(self) -> &'static str {
        match self {
            Self::Create => "creating",
            Self::Update => "updating",
            Self::Delete => "deleting",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Errors surfaced to callers of [`LifecycleService`](crate::LifecycleService).
///
/// Every variant raised while operating on a resource names the resource kind,
/// its ID and the operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid {kind} ID: {source}")]
    InvalidId {
        kind: &'static str,
        #[source]
        source: KeyError,
    },

    #[error("{} {kind} ({id}): {source}", .operation.gerund())]
    Api {
        kind: &'static str,
        id: String,
        operation: Operation,
        #[source]
        source: ApiError,
    },

    #[error("waiting for {kind} ({id}) {operation}: {source}")]
    Wait {
        kind: &'static str,
        id: String,
        operation: Operation,
        #[source]
        source: WaitError<Snapshot>,
    },

    #[error("{} {kind} ({id}): cancelled", .operation.gerund())]
    Cancelled {
        kind: &'static str,
        id: String,
        operation: Operation,
    },

    #[error("{kind} does not support waiting for {transition}")]
    Unsupported {
        kind: &'static str,
        transition: &'static str,
    },

    /// The request could not be built or EKS answered without the expected
    /// resource.
    #[error("{} {kind} ({id}): {source}", .operation.gerund())]
    Aws {
        kind: &'static str,
        id: String,
        operation: Operation,
        #[source]
        source: AwsError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    /// Errors detected before any API call was made.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidId { .. } | Self::Unsupported { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Wait { source, .. } if source.is_timeout())
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Wait { source, .. } if source.is_terminal_failure())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Last observed resource state, for failed waits.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Wait { source, .. } => source.snapshot(),
            _ => None,
        }
    }
}
