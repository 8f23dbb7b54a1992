//! Managed node group create, update and delete

use aws_sdk_eks::operation::create_nodegroup::builders::CreateNodegroupFluentBuilder;
use aws_sdk_eks::operation::update_nodegroup_config::builders::UpdateNodegroupConfigFluentBuilder;
use aws_sdk_eks::operation::update_nodegroup_version::builders::UpdateNodegroupVersionFluentBuilder;
use aws_sdk_eks::types::{Nodegroup, Update};
use eks_lifecycle_core::CancellationToken;

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::{ClusterChildId, UpdateId};
use crate::probers::NodeGroupProber;
use crate::waiters;

pub(crate) const KIND: &str = "EKS Node Group";

impl super::service::LifecycleService {
    /// Create a node group and wait for it to become `ACTIVE`.
    pub async fn create_node_group(
        &self,
        id: &ClusterChildId,
        request: CreateNodegroupFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Nodegroup> {
        let target = Target::new(KIND, id, Operation::Create);
        self.submit(
            &target,
            self.config.propagation_retry(),
            retryable::nodegroup_create,
            cancel,
            || {
                let request = request.clone();
                async move { request.send().await.map_err(ApiError::from_sdk) }
            },
        )
        .await?;

        let prober = NodeGroupProber::new(self.client.clone());
        let group = self
            .await_state(
                &target,
                &waiters::node_group_created(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(group, "DescribeNodegroup")
    }

    /// Update scaling, labels or taints and wait for the update to succeed.
    ///
    /// # Errors
    ///
    /// A `Failed` or `Cancelled` update fails the wait with the update's error
    /// details attached.
    pub async fn update_node_group_config(
        &self,
        id: &ClusterChildId,
        request: UpdateNodegroupConfigFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let target = Target::new(KIND, id, Operation::Update);
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
        self.await_node_group_update(&target, id, update, cancel)
            .await
    }

    /// Roll the node group to a new Kubernetes or AMI release version.
    pub async fn update_node_group_version(
        &self,
        id: &ClusterChildId,
        request: UpdateNodegroupVersionFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let target = Target::new(KIND, id, Operation::Update);
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
        self.await_node_group_update(&target, id, update, cancel)
            .await
    }

    async fn await_node_group_update(
        &self,
        target: &Target,
        id: &ClusterChildId,
        update: Option<Update>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let update_id = target.required(update.and_then(|u| u.id), "UpdateNodegroup")?;
        self.await_update(target, &UpdateId::node_group(id, update_id), cancel)
            .await
    }

    /// Delete a node group. `DELETE_FAILED` fails the wait with the group's
    /// health issues attached.
    pub async fn delete_node_group(
        &self,
        id: &ClusterChildId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(KIND, id, Operation::Delete);
        let accepted = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = self
                    .client
                    .delete_nodegroup()
                    .cluster_name(&id.cluster)
                    .nodegroup_name(&id.name);
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

        let prober = NodeGroupProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::node_group_deleted(&self.config),
            &prober,
            id,
            cancel,
        )
        .await?;
        Ok(())
    }
}
