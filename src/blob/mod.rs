use std::{future::Future, pin::Pin};

mod memory;
mod s3;

pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object storage as consumed by the image handlers.
pub trait BlobStore: Send + Sync + 'static {
    /// Creates `bucket` unless it already exists. Safe to call repeatedly.
    fn ensure_bucket<'a>(&'a self, bucket: &'a str) -> BoxFuture<'a, Result<(), BlobError>>;

    /// Stores `payload` under `name`, replacing any existing object.
    fn put_object<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), BlobError>>;

    fn get_object<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, BlobError>>;
}

#[derive(Debug)]
pub enum BlobError {
    NotFound { bucket: String, name: String },
    NoSuchBucket { bucket: String },
    Http(reqwest::Error),
    Status { status: u16, body: String },
    InvalidEndpoint { endpoint: String, reason: String },
    InvalidName { name: String },
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl std::fmt::Display for BlobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { bucket, name } => write!(f, "object not found: {bucket}/{name}"),
            Self::NoSuchBucket { bucket } => write!(f, "bucket does not exist: {bucket}"),
            Self::Http(e) => write!(f, "blob store request failed: {e}"),
            Self::Status { status, body } => {
                write!(f, "blob store returned status {status}: {body}")
            }
            Self::InvalidEndpoint { endpoint, reason } => {
                write!(f, "invalid blob store endpoint {endpoint}: {reason}")
            }
            Self::InvalidName { name } => write!(f, "invalid object name: {name:?}"),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BlobError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
