//! Deadline enforcement for calls to remote collaborators.

use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Run `fut`, failing with [`ClientError::Timeout`] if it does not complete
/// within `after`. The call is not retried.
pub async fn with_deadline<T, F>(op: &'static str, after: Duration, fut: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(op, ?after, "remote call deadline exceeded");
            Err(ClientError::Timeout { op, after })
        }
    }
}
