//! Cluster create, update and delete

use std::time::Duration;

use aws_sdk_eks::operation::create_cluster::builders::CreateClusterFluentBuilder;
use aws_sdk_eks::operation::update_cluster_config::builders::UpdateClusterConfigFluentBuilder;
use aws_sdk_eks::operation::update_cluster_version::builders::UpdateClusterVersionFluentBuilder;
use aws_sdk_eks::types::{Cluster, Update};
use eks_lifecycle_core::{CancellationToken, RetryConfig};

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::UpdateId;
use crate::probers::ClusterProber;
use crate::waiters;

pub(crate) const KIND: &str = "EKS Cluster";

/// A cluster scaling up rejects deletion until the scaling finishes.
const DELETE_RETRY: RetryConfig =
    RetryConfig::new(Duration::from_secs(60 * 60)).with_delay(Duration::from_secs(30));

impl super::service::LifecycleService {
    /// Create a cluster and wait for it to become `ACTIVE`.
    ///
    /// Retries while the cluster role is still propagating through IAM.
    pub async fn create_cluster(
        &self,
        name: &str,
        request: CreateClusterFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Cluster> {
        let target = Target::new(KIND, name, Operation::Create);
        self.submit(
            &target,
            self.config.propagation_retry(),
            retryable::cluster_create,
            cancel,
            || {
                let request = request.clone();
                async move { request.send().await.map_err(ApiError::from_sdk) }
            },
        )
        .await?;

        let prober = ClusterProber::new(self.client.clone());
        let cluster = self
            .await_state(
                &target,
                &waiters::cluster_created(&self.config),
                &prober,
                name,
                cancel,
            )
            .await?;
        target.required(cluster, "DescribeCluster")
    }

    /// Update logging, endpoint access or other cluster settings and wait for
    /// the update to succeed.
    ///
    /// # Errors
    ///
    /// A `Failed` or `Cancelled` update fails the wait with the update's error
    /// details attached.
    pub async fn update_cluster_config(
        &self,
        name: &str,
        request: UpdateClusterConfigFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let target = Target::new(KIND, name, Operation::Update);
        let update = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = request.clone();
                async move {
                    request
                        .send()
                        .await
                        .map(|output| output.update)
                        .map_err(ApiError::from_sdk)
                }
            })
            .await?;
        self.await_cluster_update(&target, name, update, cancel).await
    }

    /// Upgrade the Kubernetes version and wait for the update to succeed.
    pub async fn update_cluster_version(
        &self,
        name: &str,
        request: UpdateClusterVersionFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let target = Target::new(KIND, name, Operation::Update);
        let update = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = request.clone();
                async move {
                    request
                        .send()
                        .await
                        .map(|output| output.update)
                        .map_err(ApiError::from_sdk)
                }
            })
            .await?;
        self.await_cluster_update(&target, name, update, cancel).await
    }

    async fn await_cluster_update(
        &self,
        target: &Target,
        name: &str,
        update: Option<Update>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let update_id = target.required(update.and_then(|u| u.id), "UpdateCluster")?;
        self.await_update(target, &UpdateId::cluster(name, update_id), cancel)
            .await
    }

    /// Delete a cluster and wait until it has stayed gone for several probes.
    ///
    /// A cluster that is already gone counts as deleted.
    pub async fn delete_cluster(&self, name: &str, cancel: &CancellationToken) -> LifecycleResult<()> {
        let target = Target::new(KIND, name, Operation::Delete);
        let accepted = self
            .submit(&target, DELETE_RETRY, retryable::cluster_delete, cancel, || {
                let request = self.client.delete_cluster().name(name);
                async move {
                    accepted_unless_gone(
                        request.send().await.map_err(ApiError::from_sdk),
                        retryable::cluster_not_found,
                    )
                }
            })
            .await?;
        if !accepted {
            log::info!("{KIND} ({name}) already deleted");
            return Ok(());
        }

        let prober = ClusterProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::cluster_deleted(&self.config),
            &prober,
            name,
            cancel,
        )
        .await?;
        Ok(())
    }
}
