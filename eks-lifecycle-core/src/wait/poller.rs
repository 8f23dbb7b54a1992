//! Fixed-interval status polling
//!
//! [`wait_for_state`] drives a [`StatusProber`] until the observed status
//! lands in the target set, leaves the pending set, or the deadline passes.
//! EKS transitions take minutes, so the interval is fixed rather than backed
//! off. The cancellation token is checked before every probe and raced against
//! every sleep.

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::error::WaitError;
use super::prober::{Probe, StatusProber};
use super::spec::{StatusClass, WaitSpec};

/// Stand-in deadline for timeouts too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The instant `timeout` from now, saturating instead of overflowing.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `false` when the sleep was interrupted by cancellation.
pub(crate) async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = time::sleep(duration) => true,
    }
}

/// Poll `prober` for `key` until `spec` is satisfied.
///
/// Returns the snapshot that satisfied the target, or `None` when the target
/// was the resource's absence.
pub async fn wait_for_state<P>(
    spec: &WaitSpec,
    prober: &P,
    key: &P::Key,
    cancel: &CancellationToken,
) -> Result<Option<P::Snapshot>, WaitError<P::Snapshot>>
where
    P: StatusProber + ?Sized,
{
    let kind = prober.resource_kind();
    let deadline = deadline_after(spec.timeout());
    let interval = spec.interval();

    if !sleep_or_cancel(spec.delay(), cancel).await {
        return Err(WaitError::Cancelled);
    }

    let mut last_snapshot: Option<P::Snapshot> = None;
    let mut last_state = String::new();
    let mut not_found = 0u32;
    let mut target_seen = 0u32;
    let mut probes = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(WaitError::Cancelled);
        }

        probes += 1;
        let probed = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            probed = time::timeout_at(deadline, prober.probe(key)) => probed,
        };

        let Ok(probed) = probed else {
            return Err(timeout_error(spec, prober, last_state, last_snapshot));
        };

        match probed.map_err(|e| WaitError::Probe(Box::new(e)))? {
            Probe::NotFound => {
                last_snapshot = None;
                last_state.clear();
                if spec.absence_is_target() {
                    target_seen += 1;
                    log::debug!("{kind} ({key}) not found (probe {probes})");
                    if target_seen >= spec.target_occurrences() {
                        log::info!("{kind} ({key}) is gone");
                        return Ok(None);
                    }
                } else {
                    target_seen = 0;
                    not_found += 1;
                    log::debug!(
                        "{kind} ({key}) not found yet ({not_found}/{})",
                        spec.not_found_limit()
                    );
                    if not_found > spec.not_found_limit() {
                        return Err(WaitError::NotFound { checks: not_found });
                    }
                }
            }
            Probe::Found { snapshot, status } => {
                not_found = 0;
                log::debug!("{kind} ({key}) is {status} (probe {probes})");
                match spec.classify(&status) {
                    StatusClass::Target => {
                        target_seen += 1;
                        if target_seen >= spec.target_occurrences() {
                            log::info!("{kind} ({key}) reached {status}");
                            return Ok(Some(snapshot));
                        }
                    }
                    StatusClass::Pending => target_seen = 0,
                    StatusClass::Unexpected => {
                        let last_error = prober.diagnose(&snapshot);
                        log::warn!("{kind} ({key}) entered unexpected state {status}");
                        return Err(WaitError::UnexpectedState {
                            state: status,
                            target: spec.target_states().to_vec(),
                            snapshot: Box::new(snapshot),
                            last_error,
                        });
                    }
                }
                last_snapshot = Some(snapshot);
                last_state = status;
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(timeout_error(spec, prober, last_state, last_snapshot));
        }
        if !sleep_or_cancel(interval.min(deadline - now), cancel).await {
            return Err(WaitError::Cancelled);
        }
    }
}

fn timeout_error<P>(
    spec: &WaitSpec,
    prober: &P,
    last_state: String,
    last_snapshot: Option<P::Snapshot>,
) -> WaitError<P::Snapshot>
where
    P: StatusProber + ?Sized,
{
    let last_error = last_snapshot
        .as_ref()
        .and_then(|snapshot| prober.diagnose(snapshot));
    WaitError::Timeout {
        last_state,
        target: spec.target_states().to_vec(),
        timeout: spec.timeout(),
        snapshot: last_snapshot.map(Box::new),
        last_error,
    }
}
