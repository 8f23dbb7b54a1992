//! Error signatures that EKS returns while a dependency is still propagating.
//!
//! Each predicate is used by exactly one call site. Anything not listed here is
//! surfaced after the first attempt.

use super::{ApiError, CLIENT_EXCEPTION, INVALID_PARAMETER, RESOURCE_IN_USE, RESOURCE_NOT_FOUND};

const CLUSTER_ROLE_NOT_READY: &[&str] = &[
    // roleArn, arn:aws:iam::123456789012:role/XXX, does not exist
    "does not exist",
    "Error in role params",
    "Role could not be assumed because the trusted entity is not correct",
    "The provided role doesn't have the Amazon EKS Managed Policies associated with it",
    // IAM role's policy must include the `ec2:DescribeSubnets` action
    "IAM role's policy must include",
];

fn invalid_parameter_containing(err: &ApiError, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|needle| err.is_with_message(INVALID_PARAMETER, needle))
}

/// CreateCluster rejected because the cluster role is not visible yet.
pub fn cluster_create(err: &ApiError) -> bool {
    invalid_parameter_containing(err, CLUSTER_ROLE_NOT_READY)
}

/// DeleteCluster rejected because another mutation (e.g. a scale-up) is running.
pub fn cluster_delete(err: &ApiError) -> bool {
    err.is_with_message(RESOURCE_IN_USE, "in progress")
}

/// The cluster is gone. EKS sometimes reports this as a `ClientException`.
pub fn cluster_not_found(err: &ApiError) -> bool {
    err.is_not_found() || err.is_with_message(CLIENT_EXCEPTION, "No cluster found for name:")
}

/// CreateAddon raced the cluster's networking or the service account role.
pub fn addon_create(err: &ApiError) -> bool {
    invalid_parameter_containing(err, &["CREATE_FAILED", "does not exist"])
}

/// CreateNodegroup rejected because the node role is not usable yet.
pub fn nodegroup_create(err: &ApiError) -> bool {
    invalid_parameter_containing(err, &["does not exist", "not authorized"])
}

pub fn fargate_profile_create(err: &ApiError) -> bool {
    invalid_parameter_containing(err, &["Misconfigured PodExecutionRole Trust Policy"])
}

/// AssociateAccessPolicy issued before the access entry's principal is visible.
pub fn access_policy_association(err: &ApiError) -> bool {
    err.is_with_message(
        RESOURCE_NOT_FOUND,
        "The specified principalArn could not be found",
    )
}

/// Never retry.
pub fn never(_err: &ApiError) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        INVALID_PARAMETER,
        "roleArn, arn:aws:iam::123456789012:role/eks, does not exist",
        true
    )]
    #[case(INVALID_PARAMETER, "Error in role params", true)]
    #[case(
        INVALID_PARAMETER,
        "The provided role doesn't have the Amazon EKS Managed Policies associated with it. Please ensure the following policy is attached: arn:aws:iam::aws:policy/AmazonEKSClusterPolicy",
        true
    )]
    #[case(
        INVALID_PARAMETER,
        "IAM role's policy must include the `ec2:DescribeSubnets` action",
        true
    )]
    #[case(INVALID_PARAMETER, "Subnets specified must be in at least two different AZs", false)]
    #[case("AccessDeniedException", "does not exist", false)]
    fn test_cluster_create(#[case] code: &str, #[case] message: &str, #[case] expected: bool) {
        assert_eq!(cluster_create(&ApiError::new(code, message)), expected);
    }

    #[rstest]
    #[case(RESOURCE_NOT_FOUND, "No cluster found for name: c1.", true)]
    #[case(CLIENT_EXCEPTION, "No cluster found for name: tf-acc-test-0o1f8", true)]
    #[case(CLIENT_EXCEPTION, "throttled", false)]
    fn test_cluster_not_found(#[case] code: &str, #[case] message: &str, #[case] expected: bool) {
        assert_eq!(cluster_not_found(&ApiError::new(code, message)), expected);
    }

    #[test]
    fn test_cluster_delete() {
        assert!(cluster_delete(&ApiError::new(
            RESOURCE_IN_USE,
            "Cannot delete because cluster c1 currently has an update in progress"
        )));
        assert!(!cluster_delete(&ApiError::new(
            RESOURCE_IN_USE,
            "Cluster has nodegroups attached"
        )));
    }

    #[test]
    fn test_child_resource_signatures() {
        assert!(addon_create(&ApiError::new(
            INVALID_PARAMETER,
            "Addon vpc-cni is in CREATE_FAILED state"
        )));
        assert!(nodegroup_create(&ApiError::new(
            INVALID_PARAMETER,
            "User is not authorized to perform iam:PassRole"
        )));
        assert!(fargate_profile_create(&ApiError::new(
            INVALID_PARAMETER,
            "Misconfigured PodExecutionRole Trust Policy; Please add the eks-fargate-pods.amazonaws.com Service Principal"
        )));
        assert!(access_policy_association(&ApiError::new(
            RESOURCE_NOT_FOUND,
            "The specified principalArn could not be found"
        )));
        assert!(!never(&ApiError::new(INVALID_PARAMETER, "does not exist")));
    }
}
