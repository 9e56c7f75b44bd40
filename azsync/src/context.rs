//! Call context carrying cancellation and an optional deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Cancellation scope for a single reconcile call.
///
/// Every remote request and every wait on a long-running operation runs
/// under a `Context`. Cancelling it (or passing its deadline) makes the
/// pending call return promptly; provider-side work is not cancelled.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Derive a context that is cancelled together with `self` but can also
    /// be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` to completion unless the context ends first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ClientError::Cancelled),
            _ = expired => Err(ClientError::DeadlineExceeded),
            result = fut => result,
        }
    }

    /// Sleep for `duration`, waking early with an error if the context ends.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ClientError> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}
