use async_trait::async_trait;
use aws_sdk_eks::types::{Cluster, ClusterStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{aggregate, IssuesError, Probe, StatusProber};

use super::{cluster_issue, observe};
use crate::aws::{retryable, ApiError, AwsError, AwsResult};

pub struct ClusterProber {
    client: Client,
}

impl ClusterProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for ClusterProber {
    type Key = str;
    type Snapshot = Cluster;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Cluster"
    }

    async fn probe(&self, name: &str) -> AwsResult<Probe<Cluster>> {
        let result = self
            .client
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map(|output| output.cluster)
            .map_err(ApiError::from_sdk);

        observe(
            "DescribeCluster",
            result,
            retryable::cluster_not_found,
            |cluster| cluster.status().map(ClusterStatus::as_str),
        )
    }

    fn diagnose(&self, cluster: &Cluster) -> Option<IssuesError> {
        health_issues(cluster)
    }
}

fn health_issues(cluster: &Cluster) -> Option<IssuesError> {
    if cluster.status() != Some(&ClusterStatus::Failed) {
        return None;
    }
    let health = cluster.health()?;
    aggregate(health.issues().iter().map(cluster_issue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_eks::types::{ClusterHealth, ClusterIssue, ClusterIssueCode};

    #[test]
    fn test_failed_cluster_reports_health_issues() {
        let cluster = Cluster::builder()
            .name("c1")
            .status(ClusterStatus::Failed)
            .health(
                ClusterHealth::builder()
                    .issues(
                        ClusterIssue::builder()
                            .code(ClusterIssueCode::Ec2SubnetNotFound)
                            .message("subnet-0a1b was deleted")
                            .resource_ids("subnet-0a1b")
                            .build(),
                    )
                    .build(),
            )
            .build();

        let err = health_issues(&cluster).unwrap();
        assert_eq!(
            err.to_string(),
            "subnet-0a1b: Ec2SubnetNotFound: subnet-0a1b was deleted"
        );
    }

    #[test]
    fn test_failed_cluster_without_health_has_no_detail() {
        let cluster = Cluster::builder().status(ClusterStatus::Failed).build();
        assert!(health_issues(&cluster).is_none());
    }
}
