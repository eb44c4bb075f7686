//! Time-bounded startup steps

use std::future::Future;
use std::time::Duration;
use tracing::error;

use crate::{Error, Result};

/// Run `future`, failing with [`Error::Timeout`] if it exceeds `limit`
///
/// The future is dropped on timeout. Work already moved to a blocking
/// thread keeps running, but its result is discarded.
pub async fn with_timeout<F, T>(operation: &str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            error!("{} did not finish within {:?}", operation, limit);
            Err(Error::timeout(operation, limit))
        }
    }
}
