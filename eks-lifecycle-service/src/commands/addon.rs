//! Add-on create, update and delete

use aws_sdk_eks::operation::create_addon::builders::CreateAddonFluentBuilder;
use aws_sdk_eks::operation::delete_addon::builders::DeleteAddonFluentBuilder;
use aws_sdk_eks::operation::update_addon::builders::UpdateAddonFluentBuilder;
use aws_sdk_eks::types::{Addon, Update};
use eks_lifecycle_core::CancellationToken;

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::{ClusterChildId, UpdateId};
use crate::probers::AddonProber;
use crate::waiters;

pub(crate) const KIND: &str = "EKS Add-On";

impl super::service::LifecycleService {
    /// Create an add-on and wait for it to become `ACTIVE`.
    ///
    /// A `CREATE_FAILED` or `DEGRADED` add-on fails the wait with its health
    /// issues attached.
    pub async fn create_addon(
        &self,
        id: &ClusterChildId,
        request: CreateAddonFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Addon> {
        let target = Target::new(KIND, id, Operation::Create);
        self.submit(
            &target,
            self.config.propagation_retry(),
            retryable::addon_create,
            cancel,
            || {
                let request = request.clone();
                async move { request.send().await.map_err(ApiError::from_sdk) }
            },
        )
        .await?;

        let prober = AddonProber::new(self.client.clone());
        let addon = self
            .await_state(
                &target,
                &waiters::addon_created(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(addon, "DescribeAddon")
    }

    /// Submit an add-on update and wait for the update to succeed.
    ///
    /// # Errors
    ///
    /// A `Failed` or `Cancelled` update fails the wait with the update's error
    /// details attached.
    pub async fn update_addon(
        &self,
        id: &ClusterChildId,
        request: UpdateAddonFluentBuilder,
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
        let update_id = target.required(update.and_then(|u| u.id), "UpdateAddon")?;
        self.await_update(&target, &UpdateId::addon(id, update_id), cancel)
            .await
    }

    /// Delete an add-on. `request` carries options such as `preserve`.
    pub async fn delete_addon(
        &self,
        id: &ClusterChildId,
        request: DeleteAddonFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(KIND, id, Operation::Delete);
        let accepted = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = request.clone();
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

        let prober = AddonProber::new(self.client.clone());
        self.await_state(
            &target,
            &waiters::addon_deleted(&self.config),
            &prober,
            id,
            cancel,
        )
        .await?;
        Ok(())
    }
}
