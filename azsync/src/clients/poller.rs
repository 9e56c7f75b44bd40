//! Long-running operation polling.

use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::arm::ArmClient;
use crate::context::Context;
use crate::error::ClientError;

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Where to poll an in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OperationHandle {
    /// Status monitor returning `{"status": ...}`.
    AsyncOperation(String),
    /// Location URL answering 202 until the operation finishes.
    Location(String),
}

impl OperationHandle {
    /// Extract the polling URL from a 201/202 response. The async operation
    /// header wins when both are present.
    pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        header(ASYNC_OPERATION)
            .map(OperationHandle::AsyncOperation)
            .or_else(|| header(LOCATION.as_str()).map(OperationHandle::Location))
    }

    fn url(&self) -> &str {
        match self {
            OperationHandle::AsyncOperation(url) | OperationHandle::Location(url) => url,
        }
    }
}

/// Delay requested by the provider, in whole seconds. Zero is ignored so the
/// client's own poll interval applies.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

enum Poll {
    Pending(Option<Duration>),
    Done,
}

/// Drives one operation handle to a terminal state.
pub(crate) struct Poller<'a> {
    client: &'a ArmClient,
    operation: &'a str,
    handle: OperationHandle,
    delay: Option<Duration>,
}

impl<'a> Poller<'a> {
    pub(crate) fn new(
        client: &'a ArmClient,
        operation: &'a str,
        handle: OperationHandle,
        delay: Option<Duration>,
    ) -> Self {
        Self {
            client,
            operation,
            handle,
            delay,
        }
    }

    /// Poll until the operation succeeds, fails or `ctx` ends.
    pub(crate) async fn wait(mut self, ctx: &Context) -> Result<(), ClientError> {
        loop {
            let delay = self.next_delay();
            ctx.sleep(delay).await?;

            match self.poll_once(ctx).await? {
                Poll::Done => return Ok(()),
                Poll::Pending(next) => {
                    debug!(operation = %self.operation, url = %self.handle.url(), "Operation in progress");
                    self.delay = next;
                }
            }
        }
    }

    fn next_delay(&mut self) -> Duration {
        self.delay.take().unwrap_or(self.client.poll_interval())
    }

    async fn poll_once(&self, ctx: &Context) -> Result<Poll, ClientError> {
        let request = self.client.http().get(self.handle.url());
        let response = self.client.send(ctx, self.operation, request).await?;
        let status = response.status();
        let next = retry_after(response.headers());

        match &self.handle {
            OperationHandle::Location(_) => match status {
                StatusCode::ACCEPTED => Ok(Poll::Pending(next)),
                StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(Poll::Done),
                _ => Err(self
                    .client
                    .error_from_response(ctx, self.operation, response)
                    .await),
            },
            OperationHandle::AsyncOperation(_) => {
                if !status.is_success() {
                    return Err(self
                        .client
                        .error_from_response(ctx, self.operation, response)
                        .await);
                }
                let body = ctx
                    .run(async {
                        response.bytes().await.map_err(|source| ClientError::Transport {
                            operation: self.operation.to_string(),
                            source,
                        })
                    })
                    .await?;
                let op: OperationStatus =
                    serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
                        operation: self.operation.to_string(),
                        source,
                    })?;
                self.interpret(op, next)
            }
        }
    }

    fn interpret(&self, op: OperationStatus, next: Option<Duration>) -> Result<Poll, ClientError> {
        if op.status.eq_ignore_ascii_case("succeeded") {
            return Ok(Poll::Done);
        }
        if op.status.eq_ignore_ascii_case("failed") || op.status.eq_ignore_ascii_case("canceled") {
            let (code, message) = match op.error {
                Some(e) => (e.code, e.message),
                None => (None, String::new()),
            };
            return Err(ClientError::OperationFailed {
                operation: self.operation.to_string(),
                status: op.status,
                code,
                message,
            });
        }
        Ok(Poll::Pending(next))
    }
}
