use async_trait::async_trait;
use aws_sdk_eks::types::{FargateProfile, FargateProfileStatus};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{Probe, StatusProber};

use super::observe;
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::ClusterChildId;

pub struct FargateProfileProber {
    client: Client,
}

impl FargateProfileProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProber for FargateProfileProber {
    type Key = ClusterChildId;
    type Snapshot = FargateProfile;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Fargate Profile"
    }

    async fn probe(&self, id: &ClusterChildId) -> AwsResult<Probe<FargateProfile>> {
        let result = self
            .client
            .describe_fargate_profile()
            .cluster_name(&id.cluster)
            .fargate_profile_name(&id.name)
            .send()
            .await
            .map(|output| output.fargate_profile)
            .map_err(ApiError::from_sdk);

        observe(
            "DescribeFargateProfile",
            result,
            ApiError::is_not_found,
            |profile| profile.status().map(FargateProfileStatus::as_str),
        )
    }
}
