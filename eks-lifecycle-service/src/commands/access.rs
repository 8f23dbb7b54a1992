//! Access entries and access policy associations
//!
//! Both take effect synchronously, so there is nothing to wait for after the
//! call is accepted.

use aws_sdk_eks::operation::associate_access_policy::builders::AssociateAccessPolicyFluentBuilder;
use aws_sdk_eks::operation::create_access_entry::builders::CreateAccessEntryFluentBuilder;
use aws_sdk_eks::types::AccessEntry;
use eks_lifecycle_core::CancellationToken;

use super::service::{accepted_unless_gone, single_attempt, Target};
use crate::aws::{retryable, ApiError};
use crate::error::{LifecycleResult, Operation};
use crate::ids::{AccessEntryId, AccessPolicyAssociationId};

pub(crate) const ENTRY_KIND: &str = "EKS Access Entry";
pub(crate) const ASSOCIATION_KIND: &str = "EKS Access Policy Association";

impl super::service::LifecycleService {
    /// Create an access entry. Access entries have no status to wait for.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Api`](crate::LifecycleError::Api) if EKS
    /// rejects the request, e.g. because the principal already has an entry.
    pub async fn create_access_entry(
        &self,
        id: &AccessEntryId,
        request: CreateAccessEntryFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<AccessEntry> {
        let target = Target::new(ENTRY_KIND, id, Operation::Create);
        let entry = self
            .submit(&target, single_attempt(), retryable::never, cancel, || {
                let request = request.clone();
                async move {
                    request
                        .send()
                        .await
                        .map(|output| output.access_entry)
                        .map_err(ApiError::from_sdk)
                }
            })
            .await?;
        target.required(entry, "CreateAccessEntry")
    }

    /// Delete an access entry. An entry that is already gone counts as deleted.
    pub async fn delete_access_entry(
        &self,
        id: &AccessEntryId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(ENTRY_KIND, id, Operation::Delete);
        self.submit(&target, single_attempt(), retryable::never, cancel, || {
            let request = self
                .client
                .delete_access_entry()
                .cluster_name(&id.cluster)
                .principal_arn(&id.principal_arn);
            async move {
                accepted_unless_gone(
                    request.send().await.map_err(ApiError::from_sdk),
                    ApiError::is_not_found,
                )
            }
        })
        .await?;
        Ok(())
    }

    /// Associate an access policy, retrying while the principal of a fresh
    /// access entry is not yet visible.
    pub async fn associate_access_policy(
        &self,
        id: &AccessPolicyAssociationId,
        request: AssociateAccessPolicyFluentBuilder,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(ASSOCIATION_KIND, id, Operation::Create);
        self.submit(
            &target,
            self.config.propagation_retry(),
            retryable::access_policy_association,
            cancel,
            || {
                let request = request.clone();
                async move { request.send().await.map_err(ApiError::from_sdk) }
            },
        )
        .await?;
        Ok(())
    }

    /// Remove an access policy from a principal. A missing association counts
    /// as removed.
    pub async fn disassociate_access_policy(
        &self,
        id: &AccessPolicyAssociationId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let target = Target::new(ASSOCIATION_KIND, id, Operation::Delete);
        self.submit(&target, single_attempt(), retryable::never, cancel, || {
            let request = self
                .client
                .disassociate_access_policy()
                .cluster_name(&id.cluster)
                .principal_arn(&id.principal_arn)
                .policy_arn(&id.policy_arn);
            async move {
                accepted_unless_gone(
                    request.send().await.map_err(ApiError::from_sdk),
                    ApiError::is_not_found,
                )
            }
        })
        .await?;
        Ok(())
    }
}
