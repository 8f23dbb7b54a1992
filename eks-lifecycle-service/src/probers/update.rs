use async_trait::async_trait;
use aws_sdk_eks::types::{Update, UpdateStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{aggregate, IssuesError, Probe, StatusProber};

use super::{error_detail, observe};
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::{UpdateId, UpdateScope};

/// Tracks an in-place update of a cluster, add-on or node group.
pub struct UpdateProber {
    client: Client,
}

impl UpdateProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for UpdateProber {
    type Key = UpdateId;
    type Snapshot = Update;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Update"
    }

    async fn probe(&self, id: &UpdateId) -> AwsResult<Probe<Update>> {
        let request = self
            .client
            .describe_update()
            .name(&id.cluster)
            .update_id(&id.update_id);
        let request = match &id.scope {
            UpdateScope::Cluster => request,
            UpdateScope::Addon(name) => request.addon_name(name),
            UpdateScope::NodeGroup(name) => request.nodegroup_name(name),
        };
        let result = request
            .send()
            .await
            .map(|output| output.update)
            .map_err(ApiError::from_sdk);

        observe("DescribeUpdate", result, ApiError::is_not_found, |update| {
            update.status().map(UpdateStatus::as_str)
        })
    }

    fn diagnose(&self, update: &Update) -> Option<IssuesError> {
        error_details(update)
    }
}

fn error_details(update: &Update) -> Option<IssuesError> {
    match update.status() {
        Some(UpdateStatus::Failed | UpdateStatus::Cancelled) => {
            aggregate(update.errors().iter().map(error_detail))
        }
        _ => None,
    }
}
