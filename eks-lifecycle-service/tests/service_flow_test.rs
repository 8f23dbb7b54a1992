//! Create and delete flows driven against a local EKS endpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_eks::config::{BehaviorVersion, Credentials, Region};
use eks_lifecycle_core::{lock_key, CancellationToken, LifecycleConfig, MutationSerializer};
use eks_lifecycle_service::ids::ClusterChildId;
use eks_lifecycle_service::{LifecycleService, ResourceKind, Snapshot, Transition};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> LifecycleConfig {
    LifecycleConfig {
        poll_interval_secs: 1,
        retry_delay_secs: 1,
        propagation_timeout_secs: 30,
        ..LifecycleConfig::default()
    }
}

fn service_for(server: &MockServer, serializer: Arc<MutationSerializer>) -> LifecycleService {
    let config = aws_sdk_eks::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-west-2"))
        .endpoint_url(server.uri())
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
        .retry_config(aws_sdk_eks::config::retry::RetryConfig::disabled())
        .build();
    LifecycleService::from_client(aws_sdk_eks::Client::from_conf(config), fast_config(), serializer)
}

fn api_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("x-amzn-ErrorType", code)
        .set_body_json(json!({ "message": message }))
}

async fn requests(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == verb)
        .count()
}

fn fargate_profile(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "fargateProfile": {
            "fargateProfileName": "fp1",
            "clusterName": "c1",
            "status": status,
        }
    }))
}

async fn mount_fargate_profile(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/clusters/c1/fargate-profiles"))
        .respond_with(fargate_profile("CREATING"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clusters/c1/fargate-profiles/fp1"))
        .respond_with(fargate_profile("CREATING"))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clusters/c1/fargate-profiles/fp1"))
        .respond_with(fargate_profile("ACTIVE"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fargate_submission_waits_for_cluster_lock() {
    let server = MockServer::start().await;
    mount_fargate_profile(&server).await;
    let serializer = Arc::new(MutationSerializer::new());
    let service = service_for(&server, Arc::clone(&serializer));
    let id = ClusterChildId::new("c1", "fp1");
    let request = service
        .client()
        .create_fargate_profile()
        .cluster_name("c1")
        .fargate_profile_name("fp1")
        .pod_execution_role_arn("arn:aws:iam::123456789012:role/pods");
    let cancel = CancellationToken::new();
    let key = lock_key("c1", "fargate-profiles");

    // Polled first, so the other mutation holds the lock before the create
    // tries to take it.
    let other_mutation = serializer.with_lock(&key, async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        requests(&server, "POST").await
    });
    let (posts_while_locked, created) = tokio::join!(
        other_mutation,
        service.create_fargate_profile(&id, request, &cancel)
    );

    assert_eq!(posts_while_locked, 0);
    let profile = created.unwrap();
    assert_eq!(profile.fargate_profile_name(), Some("fp1"));
    assert_eq!(requests(&server, "POST").await, 1);
}

#[tokio::test]
async fn test_fargate_wait_runs_outside_cluster_lock() {
    let server = MockServer::start().await;
    mount_fargate_profile(&server).await;
    let serializer = Arc::new(MutationSerializer::new());
    let service = service_for(&server, Arc::clone(&serializer));
    let id = ClusterChildId::new("c1", "fp1");
    let request = service
        .client()
        .create_fargate_profile()
        .cluster_name("c1")
        .fargate_profile_name("fp1");
    let cancel = CancellationToken::new();
    let key = lock_key("c1", "fargate-profiles");
    let done = AtomicBool::new(false);

    let create = async {
        let result = service.create_fargate_profile(&id, request, &cancel).await;
        done.store(true, Ordering::SeqCst);
        result
    };
    let sibling = async {
        for _ in 0..250 {
            if requests(&server, "POST").await > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::timeout(
            Duration::from_millis(500),
            serializer.with_lock(&key, async { done.load(Ordering::SeqCst) }),
        )
        .await
    };
    let (created, sibling) = tokio::join!(create, sibling);

    created.unwrap();
    let create_finished_first = sibling.expect("lock should be free while the create waits");
    assert!(!create_finished_first);
}

#[tokio::test]
async fn test_cluster_already_gone_skips_wait() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/clusters/c1"))
        .respond_with(api_error(400, "ClientException", "No cluster found for name: c1."))
        .expect(1)
        .mount(&server)
        .await;
    let service = service_for(&server, Arc::new(MutationSerializer::new()));

    service
        .delete_cluster("c1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(requests(&server, "GET").await, 0);
}

#[tokio::test]
async fn test_addon_create_retries_then_waits() {
    let server = MockServer::start().await;
    let addon = json!({
        "addon": { "addonName": "vpc-cni", "clusterName": "c1", "status": "ACTIVE" }
    });
    Mock::given(method("POST"))
        .and(path("/clusters/c1/addons"))
        .respond_with(api_error(
            400,
            "InvalidParameterException",
            "The role arn:aws:iam::123456789012:role/vpc-cni does not exist",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clusters/c1/addons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(addon.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clusters/c1/addons/vpc-cni"))
        .respond_with(ResponseTemplate::new(200).set_body_json(addon))
        .mount(&server)
        .await;
    let service = service_for(&server, Arc::new(MutationSerializer::new()));
    let request = service
        .client()
        .create_addon()
        .cluster_name("c1")
        .addon_name("vpc-cni");

    let addon = service
        .create_addon(
            &ClusterChildId::new("c1", "vpc-cni"),
            request,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(addon.addon_name(), Some("vpc-cni"));
    assert_eq!(requests(&server, "POST").await, 2);
    assert_eq!(requests(&server, "GET").await, 1);
}

#[tokio::test]
async fn test_non_retryable_create_error_names_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clusters/c1/addons"))
        .respond_with(api_error(
            400,
            "InvalidParameterException",
            "Addon version is not supported",
        ))
        .mount(&server)
        .await;
    let service = service_for(&server, Arc::new(MutationSerializer::new()));
    let request = service
        .client()
        .create_addon()
        .cluster_name("c1")
        .addon_name("vpc-cni");

    let err = service
        .create_addon(
            &ClusterChildId::new("c1", "vpc-cni"),
            request,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "creating EKS Add-On (c1:vpc-cni): InvalidParameterException: Addon version is not supported"
    );
    assert_eq!(requests(&server, "POST").await, 1);
}

#[tokio::test]
async fn test_failed_node_group_carries_health_issues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clusters/c1/node-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodegroup": { "nodegroupName": "ng1", "clusterName": "c1", "status": "CREATING" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clusters/c1/node-groups/ng1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodegroup": {
                "nodegroupName": "ng1",
                "clusterName": "c1",
                "status": "CREATE_FAILED",
                "health": {
                    "issues": [{
                        "code": "NodeCreationFailure",
                        "message": "Instances failed to join the kubernetes cluster",
                        "resourceIds": ["i-0a1b2c3d"]
                    }]
                }
            }
        })))
        .mount(&server)
        .await;
    let service = service_for(&server, Arc::new(MutationSerializer::new()));
    let request = service
        .client()
        .create_nodegroup()
        .cluster_name("c1")
        .nodegroup_name("ng1");

    let err = service
        .create_node_group(
            &ClusterChildId::new("c1", "ng1"),
            request,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_terminal_failure(), "{err}");
    assert!(matches!(err.snapshot(), Some(Snapshot::NodeGroup(_))));
    let message = err.to_string();
    assert!(
        message.starts_with("waiting for EKS Node Group (c1:ng1) create: unexpected state 'CREATE_FAILED'"),
        "{message}"
    );
    assert!(
        message.contains("i-0a1b2c3d: NodeCreationFailure: Instances failed to join"),
        "{message}"
    );
}

#[tokio::test]
async fn test_capability_create_and_gone_delete() {
    let server = MockServer::start().await;
    let capability = json!({
        "capability": { "capabilityName": "argocd", "clusterName": "c1", "status": "ACTIVE" }
    });
    Mock::given(method("POST"))
        .and(path_regex("^/clusters/c1/capabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(capability.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/clusters/c1/capabilities/argocd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(capability))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/clusters/c1/capabilities/argocd"))
        .respond_with(api_error(404, "ResourceNotFoundException", "No capability found"))
        .mount(&server)
        .await;
    let service = service_for(&server, Arc::new(MutationSerializer::new()));
    let id = ClusterChildId::new("c1", "argocd");
    let cancel = CancellationToken::new();
    let request = service
        .client()
        .create_capability()
        .cluster_name("c1")
        .capability_name("argocd");

    let created = service.create_capability(&id, request, &cancel).await.unwrap();
    assert_eq!(created.capability_name(), Some("argocd"));

    let resource = ResourceKind::Capability
        .parse("c1:argocd", Transition::Created)
        .unwrap();
    let snapshot = service
        .wait_for(&resource, Transition::Created, &cancel)
        .await
        .unwrap();
    assert_eq!(snapshot.as_ref().and_then(Snapshot::status), Some("ACTIVE"));

    service.delete(&resource, &cancel).await.unwrap();
    // One probe for the create and one for the standalone wait, none after
    // the delete found nothing to remove.
    assert_eq!(requests(&server, "GET").await, 2);
    assert_eq!(requests(&server, "DELETE").await, 1);
}
