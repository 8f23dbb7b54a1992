//! Polling a remote resource until it reaches a desired status

mod error;
mod poller;
mod prober;
mod spec;

pub use error::{BoxError, WaitError};
pub(crate) use poller::{deadline_after, sleep_or_cancel};
pub use poller::wait_for_state;
pub use prober::{Probe, StatusProber};
pub use spec::{StatusClass, WaitSpec, DEFAULT_NOT_FOUND_CHECKS, DEFAULT_POLL_INTERVAL};
