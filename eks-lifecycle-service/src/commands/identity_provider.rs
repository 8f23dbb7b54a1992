//! OIDC identity provider config association and disassociation

use aws_sdk_eks::operation::associate_identity_provider_config::builders::AssociateIdentityProviderConfigFluentBuilder;
use aws_sdk_eks::types::OidcIdentityProviderConfig;
use eks_lifecycle_core::CancellationToken;

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::ClusterChildId;
use crate::probers::{oidc_config, IdentityProviderConfigProber};
use crate::waiters;

pub(crate) const KIND: &str = "EKS Identity Provider Config";

impl super::service::LifecycleService {
    /// Associate an OIDC identity provider and wait for the config to become
    /// `ACTIVE`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Api`](crate::LifecycleError::Api) if EKS
    /// rejects the association and
    /// [`LifecycleError::Wait`](crate::LifecycleError::Wait) if it never
    /// becomes active.
    pub async fn associate_identity_provider_config(
        &self,
        id: &ClusterChildId,
        request: AssociateIdentityProviderConfigFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<OidcIdentityProviderConfig> {
        let target = Target::new(KIND, id, Operation::Create);
        self.submit(&target, single_attempt(), retryable::never, cancel, || {
            let request = request.clone();
            async move { request.send().await.map_err(ApiError::from_sdk) }
        })
        .await?;

        let prober = IdentityProviderConfigProber::new(self.client.clone());
        let config = self
            .await_state(
                &target,
                &waiters::identity_provider_config_created(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(config, "DescribeIdentityProviderConfig")
    }

    /// Disassociate an OIDC identity provider and wait until the config is
    /// gone.
    pub async fn disassociate_identity_provider_config(
        &self,
        id: &ClusterChildId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(KIND, id, Operation::Delete);
        let config = oidc_config(&id.name).map_err(|err| target.aws_error(err))?;
        let accepted = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = self
                    .client
                    .disassociate_identity_provider_config()
                    .cluster_name(&id.cluster)
                    .identity_provider_config(config.clone());
                async move {
                    accepted_unless_gone(
                        request.send().await.map_err(ApiError::from_sdk),
                        ApiError::is_not_found,
                    )
                }
            })
            .await?;
        if !accepted {
            return Ok(());
        }

        let prober = IdentityProviderConfigProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::identity_provider_config_deleted(&self.config),
            &prober,
            id,
            cancel,
        )
        .await?;
        Ok(())
    }
}
