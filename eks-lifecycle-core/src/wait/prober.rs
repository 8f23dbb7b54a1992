//! The single "check current state" operation driven by the poller

use std::fmt;

use async_trait::async_trait;

use crate::issues::IssuesError;

/// Result of one status probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<S> {
    /// The backing API reported the resource as absent.
    NotFound,
    /// The resource exists; `status` is reported verbatim.
    Found { snapshot: S, status: String },
}

impl<S> Probe<S> {
    pub fn found(snapshot: S, status: impl Into<String>) -> Self {
        Self::Found {
            snapshot,
            status: status.into(),
        }
    }

    /// Observed status, empty when the resource was not found.
    pub fn status(&self) -> &str {
        match self {
            Self::NotFound => "",
            Self::Found { status, .. } => status,
        }
    }
}

/// Fetches and reports the current state of one kind of remote resource.
///
/// Implementations hold their API client and are constructed once per
/// resource kind; the key is supplied on every call. "Not found" must be
/// reported as [`Probe::NotFound`], never as an error: any `Err` stops the
/// wait immediately.
#[async_trait]
pub trait StatusProber: Send + Sync {
    type Key: fmt::Display + Send + Sync + ?Sized;
    type Snapshot: fmt::Debug + Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Human readable name used in logs and error messages, e.g. "EKS Add-On".
    fn resource_kind(&self) -> &'static str;

    async fn probe(&self, key: &Self::Key) -> Result<Probe<Self::Snapshot>, Self::Error>;

    /// Diagnostics embedded in a snapshot that ended a wait unsuccessfully.
    fn diagnose(&self, _snapshot: &Self::Snapshot) -> Option<IssuesError> {
        None
    }
}
