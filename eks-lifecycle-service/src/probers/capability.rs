use async_trait::async_trait;
use aws_sdk_eks::types::{Capability, CapabilityStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{aggregate, IssuesError, Probe, StatusProber};

use super::{capability_issue, observe};
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::ClusterChildId;

/// Probes a managed cluster capability (Argo CD, ACK or kro).
pub struct CapabilityProber {
    client: Client,
}

impl CapabilityProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for CapabilityProber {
    type Key = ClusterChildId;
    type Snapshot = Capability;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Capability"
    }

    async fn probe(&self, id: &ClusterChildId) -> AwsResult<Probe<Capability>> {
        let result = self
            .client
            .describe_capability()
            .cluster_name(&id.cluster)
            .capability_name(&id.name)
            .send()
            .await
            .map(|output| output.capability)
            .map_err(ApiError::from_sdk);

        observe("DescribeCapability", result, ApiError::is_not_found, |capability| {
            capability.status().map(CapabilityStatus::as_str)
        })
    }

    fn diagnose(&self, capability: &Capability) -> Option<IssuesError> {
        if matches!(
            capability.status(),
            Some(CapabilityStatus::Active | CapabilityStatus::Creating | CapabilityStatus::Deleting)
        ) {
            return None;
        }
        let health = capability.health()?;
        aggregate(health.issues().iter().map(capability_issue))
    }
}
