use async_trait::async_trait;
use aws_sdk_eks::types::{Addon, AddonStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{aggregate, IssuesError, Probe, StatusProber};

use super::{addon_issue, observe};
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::ClusterChildId;

pub struct AddonProber {
    client: Client,
}

impl AddonProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for AddonProber {
    type Key = ClusterChildId;
    type Snapshot = Addon;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Add-On"
    }

    async fn probe(&self, id: &ClusterChildId) -> AwsResult<Probe<Addon>> {
        let result = self
            .client
            .describe_addon()
            .cluster_name(&id.cluster)
            .addon_name(&id.name)
            .send()
            .await
            .map(|output| output.addon)
            .map_err(ApiError::from_sdk);

        observe("DescribeAddon", result, ApiError::is_not_found, |addon| {
            addon.status().map(AddonStatus::as_str)
        })
    }

    fn diagnose(&self, addon: &Addon) -> Option<IssuesError> {
        health_issues(addon)
    }
}

/// Health issues explain the failed and degraded statuses only.
fn health_issues(addon: &Addon) -> Option<IssuesError> {
    if !matches!(
        addon.status(),
        Some(
            AddonStatus::CreateFailed
                | AddonStatus::Degraded
                | AddonStatus::UpdateFailed
                | AddonStatus::DeleteFailed
        )
    ) {
        return None;
    }
    let health = addon.health()?;
    aggregate(health.issues().iter().map(addon_issue))
}
