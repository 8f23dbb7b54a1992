//! Wait specifications for every EKS transition
//!
//! Each function pairs one prober with the pending and target statuses of one
//! transition. Statuses outside both sets (e.g. `CREATE_FAILED`) end the wait.

use std::time::Duration;

use aws_sdk_eks::types::{
    AddonStatus, CapabilityStatus, ClusterStatus, ConfigStatus, FargateProfileStatus,
    NodegroupStatus, UpdateStatus,
};
use eks_lifecycle_core::{LifecycleConfig, WaitSpec};

/// Deleted clusters must stay gone for this many probes before their name is
/// considered free.
pub const CLUSTER_DELETED_OCCURRENCES: u32 = 3;

pub fn cluster_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([
            ClusterStatus::Pending.as_str(),
            ClusterStatus::Creating.as_str(),
        ])
        .target([ClusterStatus::Active.as_str()])
}

pub fn cluster_deleted(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.delete())
        .pending([
            ClusterStatus::Active.as_str(),
            ClusterStatus::Deleting.as_str(),
        ])
        .min_poll_interval(Duration::from_secs(10))
        .continuous_target_occurrence(CLUSTER_DELETED_OCCURRENCES)
}

/// Shared by cluster, add-on and node group updates.
pub fn update_successful(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.update())
        .pending([UpdateStatus::InProgress.as_str()])
        .target([UpdateStatus::Successful.as_str()])
}

pub fn addon_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([AddonStatus::Creating.as_str()])
        .target([AddonStatus::Active.as_str()])
}

pub fn addon_deleted(config: &LifecycleConfig) -> WaitSpec {
    config.wait_spec(config.timeouts.delete()).pending([
        AddonStatus::Active.as_str(),
        AddonStatus::Deleting.as_str(),
    ])
}

pub fn capability_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([CapabilityStatus::Creating.as_str()])
        .target([CapabilityStatus::Active.as_str()])
}

pub fn capability_deleted(config: &LifecycleConfig) -> WaitSpec {
    config.wait_spec(config.timeouts.delete()).pending([
        CapabilityStatus::Active.as_str(),
        CapabilityStatus::Deleting.as_str(),
    ])
}

pub fn node_group_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([NodegroupStatus::Creating.as_str()])
        .target([NodegroupStatus::Active.as_str()])
}

pub fn node_group_deleted(config: &LifecycleConfig) -> WaitSpec {
    config.wait_spec(config.timeouts.delete()).pending([
        NodegroupStatus::Active.as_str(),
        NodegroupStatus::Deleting.as_str(),
    ])
}

pub fn fargate_profile_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([FargateProfileStatus::Creating.as_str()])
        .target([FargateProfileStatus::Active.as_str()])
}

pub fn fargate_profile_deleted(config: &LifecycleConfig) -> WaitSpec {
    config.wait_spec(config.timeouts.delete()).pending([
        FargateProfileStatus::Active.as_str(),
        FargateProfileStatus::Deleting.as_str(),
    ])
}

pub fn identity_provider_config_created(config: &LifecycleConfig) -> WaitSpec {
    config
        .wait_spec(config.timeouts.create())
        .pending([ConfigStatus::Creating.as_str()])
        .target([ConfigStatus::Active.as_str()])
}

pub fn identity_provider_config_deleted(config: &LifecycleConfig) -> WaitSpec {
    config.wait_spec(config.timeouts.delete()).pending([
        ConfigStatus::Active.as_str(),
        ConfigStatus::Deleting.as_str(),
    ])
}
