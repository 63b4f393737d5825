//! Startup connectivity for the note store and the blob store.
//!
//! Both dependencies are retried forever at a fixed delay: the service would
//! rather sit unready than serve without them. Each individual attempt is
//! bounded by a timeout so one hung connection cannot stall the loop.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{
    blob::{BlobError, BlobStore, S3BlobStore, S3Config},
    config::Config,
    notes::{NoteStore, NoteStoreUrl, StoreError, open_note_store},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn note_store(config: &Config) -> Self {
        Self {
            delay: config.db_retry_delay(),
            attempt_timeout: config.connect_timeout(),
        }
    }

    pub fn blob_store(config: &Config) -> Self {
        Self {
            delay: config.blob_retry_delay(),
            attempt_timeout: config.connect_timeout(),
        }
    }
}

#[derive(Debug)]
pub enum ConnectivityError<E> {
    TimedOut { after: Duration },
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for ConnectivityError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut { after } => write!(f, "attempt timed out after {after:?}"),
            Self::Failed(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ConnectivityError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TimedOut { .. } => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// Runs one attempt, bounded by `timeout`.
pub async fn try_once<T, E, Fut>(timeout: Duration, attempt: Fut) -> Result<T, ConnectivityError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ConnectivityError::Failed(e)),
        Err(_) => Err(ConnectivityError::TimedOut { after: timeout }),
    }
}

/// Calls `attempt` until it succeeds, sleeping `policy.delay` after every
/// failure. Never gives up.
pub async fn retry_until_ok<T, E, F, Fut>(label: &str, policy: RetryPolicy, mut attempt: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    info!(dependency = label, "connecting");
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        match try_once(policy.attempt_timeout, attempt()).await {
            Ok(value) => {
                info!(dependency = label, attempts, "connected");
                return value;
            }
            Err(err) => {
                warn!(
                    dependency = label,
                    attempt = attempts,
                    retry_in_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "connection failed, retrying"
                );
            }
        }
        tokio::time::sleep(policy.delay).await;
    }
}

/// Waits until the note store opens.
///
/// An unsupported URL is a configuration error and is returned instead of
/// retried.
pub async fn connect_note_store(config: &Config) -> Result<Arc<dyn NoteStore>, StoreError> {
    let url = NoteStoreUrl::parse(&config.db_url)?;
    Ok(retry_until_ok("note store", RetryPolicy::note_store(config), || url.open()).await)
}

/// Builds the S3 client and waits until the image bucket exists.
///
/// A malformed endpoint is a configuration error and is returned instead of
/// retried.
pub async fn connect_blob_store(config: &Config) -> Result<Arc<dyn BlobStore>, BlobError> {
    let store: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(S3Config::from_config(config))?);
    provision_bucket(
        store.as_ref(),
        &config.minio_bucket,
        RetryPolicy::blob_store(config),
    )
    .await;
    Ok(store)
}

pub async fn provision_bucket(store: &dyn BlobStore, bucket: &str, policy: RetryPolicy) {
    retry_until_ok("blob store", policy, || store.ensure_bucket(bucket)).await
}

/// Single note store attempt, for `knote check`.
pub async fn check_note_store(config: &Config) -> Result<(), ConnectivityError<StoreError>> {
    try_once(config.connect_timeout(), open_note_store(&config.db_url))
        .await
        .map(|_| ())
}

/// Single blob store attempt (client plus bucket provisioning), for `knote check`.
pub async fn check_blob_store(config: &Config) -> Result<(), ConnectivityError<BlobError>> {
    let store =
        S3BlobStore::new(S3Config::from_config(config)).map_err(ConnectivityError::Failed)?;
    try_once(
        config.connect_timeout(),
        store.ensure_bucket(&config.minio_bucket),
    )
    .await
}
