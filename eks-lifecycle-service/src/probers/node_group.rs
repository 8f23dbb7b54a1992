use async_trait::async_trait;
use aws_sdk_eks::types::{Nodegroup, NodegroupStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{aggregate, IssuesError, Probe, StatusProber};

use super::{nodegroup_issue, observe};
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::ClusterChildId;

pub struct NodeGroupProber {
    client: Client,
}

impl NodeGroupProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for NodeGroupProber {
    type Key = ClusterChildId;
    type Snapshot = Nodegroup;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Node Group"
    }

    async fn probe(&self, id: &ClusterChildId) -> AwsResult<Probe<Nodegroup>> {
        let result = self
            .client
            .describe_nodegroup()
            .cluster_name(&id.cluster)
            .nodegroup_name(&id.name)
            .send()
            .await
            .map(|output| output.nodegroup)
            .map_err(ApiError::from_sdk);

        observe("DescribeNodegroup", result, ApiError::is_not_found, |group| {
            group.status().map(NodegroupStatus::as_str)
        })
    }

    fn diagnose(&self, group: &Nodegroup) -> Option<IssuesError> {
        health_issues(group)
    }
}

/// Node group health issues name the instances or Auto Scaling groups that
/// failed.
fn health_issues(group: &Nodegroup) -> Option<IssuesError> {
    if !matches!(
        group.status(),
        Some(
            NodegroupStatus::CreateFailed
                | NodegroupStatus::DeleteFailed
                | NodegroupStatus::Degraded
        )
    ) {
        return None;
    }
    let health = group.health()?;
    aggregate(health.issues().iter().map(nodegroup_issue))
}
