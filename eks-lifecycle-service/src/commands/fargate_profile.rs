//! Fargate profile create and delete
//!
//! EKS cannot process two Fargate profile mutations for the same cluster at
//! once, so the create and delete calls (not the waits) run under the
//! cluster's `fargate-profiles` lock.

use aws_sdk_eks::operation::create_fargate_profile::builders::CreateFargateProfileFluentBuilder;
use aws_sdk_eks::types::FargateProfile;
use eks_lifecycle_core::{lock_key, CancellationToken};

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::ClusterChildId;
use crate::probers::FargateProfileProber;
use crate::waiters;

pub(crate) const KIND: &str = "EKS Fargate Profile";

const LOCK_CLASS: &str = "fargate-profiles";

impl super::service::LifecycleService {
    /// Create a Fargate profile and wait for it to become `ACTIVE`.
    ///
    /// The submission waits for any other Fargate profile mutation on the
    /// same cluster. It is retried while the pod execution role's trust policy
    /// is still propagating.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Wait`](crate::LifecycleError::Wait) if the
    /// profile ends up `CREATE_FAILED` or the wait times out.
    pub async fn create_fargate_profile(
        &self,
        id: &ClusterChildId,
        request: CreateFargateProfileFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<FargateProfile> {
        let target = Target::new(KIND, id, Operation::Create);
        let submitted = self.submit(
            &target,
            self.config.propagation_retry(),
            retryable::fargate_profile_create,
            cancel,
            || {
                let request = request.clone();
                async move { request.send().await.map_err(ApiError::from_sdk) }
            },
        );
        self.serializer
            .with_lock(&lock_key(&id.cluster, LOCK_CLASS), submitted)
            .await?;

        let prober = FargateProfileProber::new(self.client.clone());
        let profile = self
            .await_state(
                &target,
                &waiters::fargate_profile_created(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(profile, "DescribeFargateProfile")
    }

    /// Delete a Fargate profile and wait until it is gone.
    ///
    /// The submission is serialized like creation. A profile that is already
    /// gone counts as deleted.
    pub async fn delete_fargate_profile(
        &self,
        id: &ClusterChildId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(KIND, id, Operation::Delete);
        let submitted = self.submit(&target, single_attempt(), retryable::never, cancel, || {
            let request = self
                .client
                .delete_fargate_profile()
                .cluster_name(&id.cluster)
                .fargate_profile_name(&id.name);
            async move {
                accepted_unless_gone(
                    request.send().await.map_err(ApiError::from_sdk),
                    ApiError::is_not_found,
                )
            }
        });
        let accepted = self
            .serializer
            .with_lock(&lock_key(&id.cluster, LOCK_CLASS), submitted)
            .await?;
        if !accepted {
            return Ok(());
        }

        let prober = FargateProfileProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::fargate_profile_deleted(&self.config),
            &prober,
            id,
            cancel,
        )
        .await?;
        Ok(())
    }
}
