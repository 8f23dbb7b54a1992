use async_trait::async_trait;
use aws_sdk_eks::types::{ConfigStatus, IdentityProviderConfig, OidcIdentityProviderConfig};
use aws_sdk_eks::Client;
use eks_lifecycle_core::{Probe, StatusProber};

use super::observe;
use crate::aws::{ApiError, AwsError, AwsResult};
use crate::ids::ClusterChildId;

const OIDC: &str = "oidc";

pub struct IdentityProviderConfigProber {
    client: Client,
}

impl IdentityProviderConfigProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request shape naming an OIDC config of a cluster.
pub(crate) fn oidc_config(name: &str) -> AwsResult<IdentityProviderConfig> {
    IdentityProviderConfig::builder()
        .r#type(OIDC)
        .name(name)
        .build()
        .map_err(|e| AwsError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl StatusProber for IdentityProviderConfigProber {
    type Key = ClusterChildId;
    type Snapshot = OidcIdentityProviderConfig;
    type Error = AwsError;

    fn resource_kind(&self) -> &'static str {
        "EKS Identity Provider Config"
    }

    async fn probe(&self, id: &ClusterChildId) -> AwsResult<Probe<OidcIdentityProviderConfig>> {
        let result = self
            .client
            .describe_identity_provider_config()
            .cluster_name(&id.cluster)
            .identity_provider_config(oidc_config(&id.name)?)
            .send()
            .await
            .map(|output| output.identity_provider_config.and_then(|config| config.oidc))
            .map_err(ApiError::from_sdk);

        observe(
            "DescribeIdentityProviderConfig",
            result,
            ApiError::is_not_found,
            |config| config.status().map(ConfigStatus::as_str),
        )
    }
}
