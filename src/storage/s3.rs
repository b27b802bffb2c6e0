use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::{ProfileFileCredentialsProvider, ProfileFileRegionProvider};
use aws_config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;

use super::{StateStore, StorageError};
use crate::credentials::CredentialSource;

const CREDENTIALS_PROVIDER_NAME: &str = "tfbackend-static";

/// S3 client bound to one resolved credential source.
#[derive(Clone)]
pub struct S3StateStore {
    client: aws_sdk_s3::Client,
    strategy: &'static str,
}

impl S3StateStore {
    /// Builds the client. No request is sent until an object is fetched.
    pub async fn connect(source: &CredentialSource, endpoint_url: Option<&str>) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled());

        let loader = match source {
            CredentialSource::Static {
                access_key,
                secret_key,
                session_token,
                region,
            } => loader
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    session_token.clone(),
                    None,
                    CREDENTIALS_PROVIDER_NAME,
                ))
                .region(Region::new(region.clone())),
            CredentialSource::Profile {
                name,
                fallback_region,
            } => {
                // NOTE: Only the named profile is consulted, never AWS_* env credentials
                let credentials = ProfileFileCredentialsProvider::builder()
                    .profile_name(name)
                    .build();
                let region = RegionProviderChain::first_try(
                    ProfileFileRegionProvider::builder()
                        .profile_name(name)
                        .build(),
                )
                .or_else(Region::new(fallback_region.clone()));

                loader
                    .profile_name(name)
                    .credentials_provider(credentials)
                    .region(region)
            }
        };

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            strategy: source.strategy(),
        }
    }
}

#[async_trait]
impl StateStore for S3StateStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| from_sdk_error(err, bucket, key))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Storage {
                message: format!("failed to read s3://{}/{}: {}", bucket, key, e),
            })?;

        Ok(body.into_bytes().to_vec())
    }
}

fn from_sdk_error(err: SdkError<GetObjectError>, bucket: &str, key: &str) -> StorageError {
    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.as_service_error().and_then(|e| e.code());
    let no_such_key = err
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key);

    if no_such_key {
        return StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
    }

    classify_failure(
        status,
        code,
        bucket,
        key,
        DisplayErrorContext(&err).to_string(),
    )
}

fn classify_failure(
    status: Option<u16>,
    code: Option<&str>,
    bucket: &str,
    key: &str,
    message: String,
) -> StorageError {
    match (status, code) {
        (_, Some("NoSuchKey" | "NoSuchBucket")) | (Some(404), _) => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        (_, Some("AccessDenied" | "AllAccessDisabled" | "InvalidAccessKeyId"))
        | (Some(403), _) => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StorageError::Storage { message },
    }
}

impl std::fmt::Debug for S3StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StateStore")
            .field("credentials", &self.strategy)
            .finish()
    }
}
