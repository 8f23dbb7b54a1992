//! Declarative description of a single wait

use std::time::Duration;

/// Poll interval used when a wait does not set its own.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Consecutive not-found observations tolerated while waiting for a resource
/// that should exist.
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// How an observed status relates to a [`WaitSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Keep polling.
    Pending,
    /// Desired state reached.
    Target,
    /// Neither pending nor target, e.g. `CREATE_FAILED`.
    Unexpected,
}

/// Pending and target status sets plus timing for one wait invocation.
///
/// Built per resource kind by small constructor functions so that the status
/// lists live next to the resource they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    pending: Vec<String>,
    target: Vec<String>,
    timeout: Duration,
    poll_interval: Duration,
    min_poll_interval: Duration,
    initial_delay: Duration,
    not_found_checks: u32,
    continuous_target_occurrence: u32,
}

impl WaitSpec {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Vec::new(),
            target: Vec::new(),
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_poll_interval: Duration::ZERO,
            initial_delay: Duration::ZERO,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
        }
    }

    #[must_use]
    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Target statuses. Leaving this empty means "wait until the resource is
    /// gone".
    #[must_use]
    pub fn target<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = statuses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Require `occurrences` consecutive target observations before succeeding.
    #[must_use]
    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pending_states(&self) -> &[String] {
        &self.pending
    }

    pub fn target_states(&self) -> &[String] {
        &self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Effective interval between probes.
    pub fn interval(&self) -> Duration {
        self.poll_interval.max(self.min_poll_interval)
    }

    pub fn delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn not_found_limit(&self) -> u32 {
        self.not_found_checks
    }

    pub fn target_occurrences(&self) -> u32 {
        self.continuous_target_occurrence
    }

    /// Whether absence of the resource satisfies this wait.
    pub fn absence_is_target(&self) -> bool {
        self.target.is_empty() || self.target.iter().any(String::is_empty)
    }

    pub fn classify(&self, status: &str) -> StatusClass {
        if self.target.iter().any(|s| s == status) {
            StatusClass::Target
        } else if self.pending.iter().any(|s| s == status) {
            StatusClass::Pending
        } else {
            StatusClass::Unexpected
        }
    }
}
