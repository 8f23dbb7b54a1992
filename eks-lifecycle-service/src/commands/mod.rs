//! Commands module - create, update and delete flows for each EKS resource kind

pub(crate) mod access;
pub(crate) mod addon;
pub(crate) mod capability;
pub(crate) mod cluster;
pub(crate) mod fargate_profile;
pub(crate) mod identity_provider;
pub(crate) mod node_group;
pub(crate) mod service;

pub use service::LifecycleService;
