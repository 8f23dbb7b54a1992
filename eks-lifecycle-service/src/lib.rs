//! This crate binds the lifecycle engine to Amazon EKS:
//! - Status probers over the `Describe*` operations
//! - Wait specifications for every create, update and delete transition
//! - Retryable error signatures for eventually consistent mutations
//! - The [`LifecycleService`] create/update/delete flows
//!

mod aws;
pub mod commands;
mod error;
pub mod ids;
pub mod probers;
mod resource;
pub mod waiters;

// Re-exports for a small, focused public API
pub use aws::{
    load_sdk_config, retryable, ApiError, AwsError, AwsResult, CLIENT_EXCEPTION,
    INVALID_PARAMETER, RESOURCE_IN_USE, RESOURCE_NOT_FOUND,
};
pub use commands::LifecycleService;
pub use error::{LifecycleError, LifecycleResult, Operation};
pub use probers::Snapshot;
pub use resource::{ResourceKind, ResourceRef, Transition};
