mod error;
mod s3;

pub use error::StorageError;
pub use s3::S3StateStore;

use std::collections::HashMap;

use async_trait::async_trait;

/// Source of raw state objects addressed by bucket and key.
#[async_trait]
pub trait StateStore: Send + Sync {
    fn name(&self) -> &str;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Store backed by a map, for tests and offline runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn with_object(mut self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(bucket, key, body);
        self
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
