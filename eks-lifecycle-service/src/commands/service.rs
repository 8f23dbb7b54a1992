//! EKS Lifecycle Service Layer
//!
//! The service holds the EKS client, the shared mutation serializer and the
//! timing configuration. Per-kind operations live in sibling modules; this
//! module provides the submit and wait steps they share.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_eks::types::Update;
use aws_sdk_eks::Client as EksClient;
use eks_lifecycle_core::{
    retry_when, wait_for_state, CancellationToken, LifecycleConfig, MutationSerializer,
    RetryConfig, RetryError, StatusProber, WaitError, WaitSpec,
};

use crate::aws::{load_sdk_config, ApiError, AwsError};
use crate::error::{LifecycleError, LifecycleResult, Operation};
use crate::ids::UpdateId;
use crate::probers::{Snapshot, UpdateProber};
use crate::waiters;

/// Main service struct that holds the EKS client and runs lifecycle operations
pub struct LifecycleService {
    pub(crate) client: EksClient,
    pub(crate) serializer: Arc<MutationSerializer>,
    pub(crate) config: LifecycleConfig,
}

/// The resource and operation a submit or wait step acts on.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) kind: &'static str,
    pub(crate) id: String,
    pub(crate) operation: Operation,
}

impl Target {
    pub(crate) fn new(kind: &'static str, id: impl ToString, operation: Operation) -> Self {
        Self {
            kind,
            id: id.to_string(),
            operation,
        }
    }

    fn api_error(&self, source: ApiError) -> LifecycleError {
        LifecycleError::Api {
            kind: self.kind,
            id: self.id.clone(),
            operation: self.operation,
            source,
        }
    }

    pub(crate) fn aws_error(&self, source: AwsError) -> LifecycleError {
        LifecycleError::Aws {
            kind: self.kind,
            id: self.id.clone(),
            operation: self.operation,
            source,
        }
    }

    /// Unwrap a field EKS should always return, naming `call` when it did not.
    pub(crate) fn required<T>(&self, value: Option<T>, call: &'static str) -> LifecycleResult<T> {
        value.ok_or_else(|| self.aws_error(AwsError::EmptyResult(call)))
    }

    fn cancelled(&self) -> LifecycleError {
        LifecycleError::Cancelled {
            kind: self.kind,
            id: self.id.clone(),
            operation: self.operation,
        }
    }

    fn wait_error(&self, source: WaitError<Snapshot>) -> LifecycleError {
        if source.is_cancelled() {
            return self.cancelled();
        }
        LifecycleError::Wait {
            kind: self.kind,
            id: self.id.clone(),
            operation: self.operation,
            source,
        }
    }
}

/// Retry settings for calls that are submitted exactly once.
pub(crate) const fn single_attempt() -> RetryConfig {
    RetryConfig::new(Duration::ZERO)
}

/// Map an "already gone" API error to `Ok(false)`.
pub(crate) fn accepted_unless_gone<T>(
    result: Result<T, ApiError>,
    is_gone: fn(&ApiError) -> bool,
) -> Result<bool, ApiError> {
    match result {
        Ok(_) => Ok(true),
        Err(err) if is_gone(&err) => Ok(false),
        Err(err) => Err(err),
    }
}

impl LifecycleService {
    /// Create a service using the default AWS credential provider chain.
    ///
    /// `region` and `profile` override what the environment and shared config
    /// files select.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Config`] if `config` fails validation.
    pub async fn new(
        config: LifecycleConfig,
        region: Option<String>,
        profile: Option<String>,
    ) -> LifecycleResult<Self> {
        config.validate()?;
        let sdk_config = load_sdk_config(region, profile).await;
        Ok(Self::from_client(
            EksClient::new(&sdk_config),
            config,
            Arc::new(MutationSerializer::new()),
        ))
    }

    /// Build a service around an existing client and lock registry.
    pub fn from_client(
        client: EksClient,
        config: LifecycleConfig,
        serializer: Arc<MutationSerializer>,
    ) -> Self {
        Self {
            client,
            serializer,
            config,
        }
    }

    /// The EKS client, for building requests.
    pub fn client(&self) -> &EksClient {
        &self.client
    }

    /// Timing settings every wait and retry uses.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Submit one mutating call, retrying while `is_retryable` matches.
    pub(crate) async fn submit<T, F, Fut>(
        &self,
        target: &Target,
        retry: RetryConfig,
        is_retryable: fn(&ApiError) -> bool,
        cancel: &CancellationToken,
        call: F,
    ) -> LifecycleResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let name = format!("{} {} ({})", target.operation.gerund(), target.kind, target.id);
        match retry_when(retry, &name, cancel, call, is_retryable).await {
            Ok(value) => Ok(value),
            Err(RetryError::Cancelled) => Err(target.cancelled()),
            Err(RetryError::Operation(err)) => Err(target.api_error(err)),
        }
    }

    /// Poll until `spec` is satisfied, attaching the target to any failure.
    pub(crate) async fn await_state<P>(
        &self,
        target: &Target,
        spec: &WaitSpec,
        prober: &P,
        key: &P::Key,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Option<P::Snapshot>>
    where
        P: StatusProber + ?Sized,
        P::Snapshot: Into<Snapshot>,
    {
        log::info!("waiting for {} ({}) {}", target.kind, target.id, target.operation);
        wait_for_state(spec, prober, key, cancel)
            .await
            .map_err(|err| target.wait_error(err.map_snapshot(Into::into)))
    }

    pub(crate) async fn await_update(
        &self,
        target: &Target,
        id: &UpdateId,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Update> {
        let prober = UpdateProber::new(self.client.clone());
        let update = self
            .await_state(
                target,
                &waiters::update_successful(&self.config),
                &prober,
                id,
                cancel,
            )
            .await?;
        target.required(update, "DescribeUpdate")
    }
}
