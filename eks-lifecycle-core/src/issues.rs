//! Aggregation of nested resource diagnostics
//!
//! EKS reports why a resource failed through per-resource issue lists (add-on
//! health issues, node group health issues, update error details). Each entry
//! names the sub-resources it affects, e.g. the EC2 instances that failed to
//! join a node group. This module folds such a list into one composite error.

use std::error::Error;
use std::fmt;

/// A single diagnostic attached to a remote resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    pub code: String,
    pub message: String,
    pub resource_ids: Vec<String>,
}

impl Issue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            resource_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_resource_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// One issue rendered as an error: `"{ids}: {code}: {message}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueError(pub Issue);

impl Error for IssueError {}

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issue = &self.0;
        if !issue.resource_ids.is_empty() {
            write!(f, "{}: ", issue.resource_ids.join(", "))?;
        }
        write!(f, "{}: {}", issue.code, issue.message)
    }
}

/// Composite error with one entry per aggregated issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuesError {
    issues: Vec<IssueError>,
}

impl Error for IssuesError {}

impl IssuesError {
    pub fn issues(&self) -> &[IssueError] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for IssuesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.issues.as_slice() {
            return write!(f, "{only}");
        }
        write!(f, "{} issues occurred:", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n\t* {issue}")?;
        }
        Ok(())
    }
}

/// Fold `issues` into a single error, skipping `None` entries.
///
/// Returns `None` when nothing remains to report.
pub fn aggregate<I>(issues: I) -> Option<IssuesError>
where
    I: IntoIterator<Item = Option<Issue>>,
{
    let issues: Vec<IssueError> = issues.into_iter().flatten().map(IssueError).collect();
    if issues.is_empty() {
        None
    } else {
        Some(IssuesError { issues })
    }
}
