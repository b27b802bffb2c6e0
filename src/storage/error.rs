use thiserror::Error;

/// Errors raised while fetching a state object.
///
/// SECURITY: Error messages must NEVER contain credential material.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket or key does not exist
    #[error("state object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Credentials lack permission for the object
    #[error("access denied to s3://{bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// Any other service or transport failure
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("state object s3://{bucket}/{key} is not valid UTF-8")]
    Encoding { bucket: String, key: String },
}
