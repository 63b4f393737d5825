use std::collections::{BTreeMap, HashMap};

use tokio::sync::Mutex;

use super::{BlobError, BlobStore, BoxFuture};

#[derive(Default)]
pub struct MemoryBlobStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object_names(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .await
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn ensure_bucket<'a>(&'a self, bucket: &'a str) -> BoxFuture<'a, Result<(), BlobError>> {
        Box::pin(async move {
            self.buckets
                .lock()
                .await
                .entry(bucket.to_string())
                .or_default();
            Ok(())
        })
    }

    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), BlobError>> {
        Box::pin(async move {
            let mut buckets = self.buckets.lock().await;
            let objects = buckets
                .get_mut(bucket)
                .ok_or_else(|| BlobError::NoSuchBucket {
                    bucket: bucket.to_string(),
                })?;
            objects.insert(name.to_string(), payload);
            Ok(())
        })
    }

    fn get_object<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, BlobError>> {
        Box::pin(async move {
            let buckets = self.buckets.lock().await;
            let objects = buckets.get(bucket).ok_or_else(|| BlobError::NoSuchBucket {
                bucket: bucket.to_string(),
            })?;
            objects
                .get(name)
                .cloned()
                .ok_or_else(|| BlobError::NotFound {
                    bucket: bucket.to_string(),
                    name: name.to_string(),
                })
        })
    }
}
