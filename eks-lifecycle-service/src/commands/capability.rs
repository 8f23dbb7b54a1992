//! Managed capability create and delete

use aws_sdk_eks::operation::create_capability::builders::CreateCapabilityFluentBuilder;
use aws_sdk_eks::types::Capability;
use eks_lifecycle_core::CancellationToken;

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::ClusterChildId;
use crate::probers::CapabilityProber;
use crate::waiters;

pub(crate) const KIND: &str = "EKS Capability";

impl super::service::LifecycleService {
    /// Create a capability and wait for it to become `ACTIVE`.
    ///
    /// # Errors
    ///
    /// Fails with [`LifecycleError::Wait`](crate::LifecycleError::Wait) when
    /// the capability ends up `CREATE_FAILED` or `DEGRADED`. Its health issues
    /// are attached to the error.
    pub async fn create_capability(
        &self,
        id: &ClusterChildId,
        request: CreateCapabilityFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Capability> {
        let target = Target::new(KIND, id, Operation::Create);
        self.submit(&target, single_attempt(), retryable::never, cancel, || {
            let request = request.clone();
            async move { request.send().await.map_err(ApiError::from_sdk) }
        })
        .await?;

        let prober = CapabilityProber::new(self.client.clone());
        let capability = self
            .await_state(
                &target,
                &waiters::capability_created(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(capability, "DescribeCapability")
    }

    /// Delete a capability and wait until it is gone. A capability that is
    /// already gone counts as deleted.
    pub async fn delete_capability(
        &self,
        id: &ClusterChildId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(KIND, id, Operation::Delete);
        let accepted = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = self
                    .client
                    .delete_capability()
                    .cluster_name(&id.cluster)
                    .capability_name(&id.name);
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

        let prober = CapabilityProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::capability_deleted(&self.config),
            &prober,
            id,
            cancel,
        )
        .await?;
        Ok(())
    }
}
