//! Dispatch by resource reference, exercised without reaching EKS.

use std::sync::Arc;

use aws_sdk_eks::config::{BehaviorVersion, Region};
use eks_lifecycle_core::{CancellationToken, LifecycleConfig, MutationSerializer};
use eks_lifecycle_service::ids::UpdateId;
use eks_lifecycle_service::{LifecycleError, LifecycleService, ResourceKind, ResourceRef, Transition};
use rstest::rstest;

fn offline_service() -> LifecycleService {
    let config = aws_sdk_eks::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-west-2"))
        .build();
    LifecycleService::from_client(
        aws_sdk_eks::Client::from_conf(config),
        LifecycleConfig::default(),
        Arc::new(MutationSerializer::new()),
    )
}

#[rstest]
#[case(ResourceKind::AccessEntry, "c1:arn:aws:iam::123456789012:role/dev", Transition::Created)]
#[case(ResourceKind::AccessEntry, "c1:arn:aws:iam::123456789012:role/dev", Transition::Deleted)]
#[case(
    ResourceKind::AccessPolicyAssociation,
    "c1#arn:aws:iam::123456789012:role/dev#arn:aws:eks::aws:cluster-access-policy/AmazonEKSViewPolicy",
    Transition::Deleted
)]
#[tokio::test]
async fn test_kinds_without_waits_are_rejected(
    #[case] kind: ResourceKind,
    #[case] id: &str,
    #[case] transition: Transition,
) {
    let service = offline_service();
    let resource = kind.parse(id, transition).unwrap();

    let err = service
        .wait_for(&resource, transition, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_usage());
    assert!(matches!(err, LifecycleError::Unsupported { .. }));
}

#[tokio::test]
async fn test_updates_cannot_be_deleted() {
    let service = offline_service();
    let resource = ResourceRef::Update(UpdateId::cluster("c1", "u-1"));

    let err = service
        .delete(&resource, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "EKS Cluster does not support waiting for deleted"
    );
}

#[tokio::test]
async fn test_update_reference_needs_updated_transition() {
    let service = offline_service();
    let resource = ResourceKind::Cluster
        .parse("c1:u-1", Transition::Updated)
        .unwrap();

    let err = service
        .wait_for(&resource, Transition::Created, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_usage());
}

#[test]
fn test_malformed_id_is_rejected_before_any_call() {
    let err = ResourceKind::FargateProfile
        .parse("only-a-cluster", Transition::Created)
        .unwrap_err();

    assert!(err.is_usage());
    assert_eq!(
        err.to_string(),
        "invalid EKS Fargate Profile ID: unexpected format for ID (only-a-cluster), expected CLUSTER_NAME:FARGATE_PROFILE_NAME"
    );
}
