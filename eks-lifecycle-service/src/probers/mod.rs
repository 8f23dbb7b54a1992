//! Status probers for each EKS resource kind
//!
//! Every prober wraps one `Describe*` call. "Not found" API errors become
//! [`Probe::NotFound`](eks_lifecycle_core::Probe::NotFound); every other error
//! ends the wait.

mod addon;
mod capability;
mod cluster;
mod fargate_profile;
mod identity_provider;
mod node_group;
mod update;

pub use addon::AddonProber;
pub use capability::CapabilityProber;
pub use cluster::ClusterProber;
pub use fargate_profile::FargateProfileProber;
pub(crate) use identity_provider::oidc_config;
pub use identity_provider::IdentityProviderConfigProber;
pub use node_group::NodeGroupProber;
pub use update::UpdateProber;

use aws_sdk_eks::types::{
    Addon, AddonIssue, Capability, CapabilityIssue, Cluster, ClusterIssue, ErrorDetail,
    FargateProfile, Issue as NodegroupIssue, Nodegroup, OidcIdentityProviderConfig, Update,
};
use eks_lifecycle_core::{Issue, Probe};

use crate::aws::{ApiError, AwsError, AwsResult};

/// Last observed state of any EKS resource, carried by wait failures.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Cluster(Cluster),
    Addon(Addon),
    Capability(Capability),
    NodeGroup(Nodegroup),
    FargateProfile(FargateProfile),
    IdentityProviderConfig(OidcIdentityProviderConfig),
    Update(Update),
}

macro_rules! impl_into_snapshot {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Snapshot {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

impl_into_snapshot! {
    Cluster => Cluster,
    Addon => Addon,
    Capability => Capability,
    Nodegroup => NodeGroup,
    FargateProfile => FargateProfile,
    OidcIdentityProviderConfig => IdentityProviderConfig,
    Update => Update,
}

impl Snapshot {
    /// Status string as EKS reports it.
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Cluster(cluster) => cluster.status().map(|s| s.as_str()),
            Self::Addon(addon) => addon.status().map(|s| s.as_str()),
            Self::Capability(capability) => capability.status().map(|s| s.as_str()),
            Self::NodeGroup(group) => group.status().map(|s| s.as_str()),
            Self::FargateProfile(profile) => profile.status().map(|s| s.as_str()),
            Self::IdentityProviderConfig(config) => config.status().map(|s| s.as_str()),
            Self::Update(update) => update.status().map(|s| s.as_str()),
        }
    }
}

/// Turn a describe result into a probe outcome.
///
/// `is_not_found` decides which API errors mean the resource is absent.
pub(crate) fn observe<T>(
    operation: &'static str,
    result: Result<Option<T>, ApiError>,
    is_not_found: fn(&ApiError) -> bool,
    status: impl FnOnce(&T) -> Option<&str>,
) -> AwsResult<Probe<T>> {
    match result {
        Ok(Some(resource)) => {
            let status = status(&resource).unwrap_or_default().to_string();
            Ok(Probe::found(resource, status))
        }
        Ok(None) => Err(AwsError::EmptyResult(operation)),
        Err(err) if is_not_found(&err) => Ok(Probe::NotFound),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn cluster_issue(issue: &ClusterIssue) -> Option<Issue> {
    Some(
        Issue::new(
            issue.code().map(|c| c.as_str()).unwrap_or_default(),
            issue.message().unwrap_or_default(),
        )
        .with_resource_ids(issue.resource_ids().iter().cloned()),
    )
}

pub(crate) fn addon_issue(issue: &AddonIssue) -> Option<Issue> {
    Some(
        Issue::new(
            issue.code().map(|c| c.as_str()).unwrap_or_default(),
            issue.message().unwrap_or_default(),
        )
        .with_resource_ids(issue.resource_ids().iter().cloned()),
    )
}

/// Capability issues carry no resource IDs.
pub(crate) fn capability_issue(issue: &CapabilityIssue) -> Option<Issue> {
    Some(Issue::new(
        issue.code().map(|c| c.to_string()).unwrap_or_default(),
        issue.message().unwrap_or_default(),
    ))
}

pub(crate) fn nodegroup_issue(issue: &NodegroupIssue) -> Option<Issue> {
    Some(
        Issue::new(
            issue.code().map(|c| c.as_str()).unwrap_or_default(),
            issue.message().unwrap_or_default(),
        )
        .with_resource_ids(issue.resource_ids().iter().cloned()),
    )
}

pub(crate) fn error_detail(detail: &ErrorDetail) -> Option<Issue> {
    Some(
        Issue::new(
            detail.error_code().map(|c| c.as_str()).unwrap_or_default(),
            detail.error_message().unwrap_or_default(),
        )
        .with_resource_ids(detail.resource_ids().iter().cloned()),
    )
}
