//! AWS SDK integration: EKS error normalization and retryable error signatures.

pub mod retryable;

use std::fmt;

use aws_sdk_eks::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
pub const RESOURCE_IN_USE: &str = "ResourceInUseException";
pub const CLIENT_EXCEPTION: &str = "ClientException";

/// An EKS API failure reduced to its error code and message.
///
/// Transport failures (timeouts, dispatch errors) carry an empty code and the
/// full error chain as the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: fmt::Debug,
    {
        match err.as_service_error() {
            Some(service) => Self {
                code: service.code().unwrap_or_default().to_string(),
                message: service
                    .message()
                    .map_or_else(|| DisplayErrorContext(&err).to_string(), str::to_string),
            },
            None => Self {
                code: String::new(),
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// `code` matches and the message contains `needle`.
    pub fn is_with_message(&self, code: &str, needle: &str) -> bool {
        self.is(code) && self.message.contains(needle)
    }

    pub fn is_not_found(&self) -> bool {
        self.is(RESOURCE_NOT_FOUND)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("invalid EKS request: {0}")]
    InvalidRequest(String),
    #[error("EKS API error: {0}")]
    Api(#[from] ApiError),
    #[error("EKS returned an empty result for {0}")]
    EmptyResult(&'static str),
}

pub type AwsResult<T> = Result<T, AwsError>;

/// Load the shared SDK config from the default credential chain.
pub async fn load_sdk_config(
    region: Option<String>,
    profile: Option<String>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_sdk_eks::config::Region::new(region));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}
