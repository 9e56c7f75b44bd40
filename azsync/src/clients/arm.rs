//! HTTP plumbing shared by every resource adapter.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::poller::{retry_after, OperationHandle, Poller};
use super::ResourceClient;
use crate::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_SECS};
use crate::context::Context;
use crate::error::ClientError;

const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

fn user_agent() -> String {
    format!("azsync/{}", env!("CARGO_PKG_VERSION"))
}

/// Supplies credentials for outgoing requests.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Bearer token to send, or `None` to send no Authorization header.
    async fn token(&self) -> Result<Option<String>, ClientError>;
}

/// A fixed bearer token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl Authorizer for StaticToken {
    async fn token(&self) -> Result<Option<String>, ClientError> {
        Ok(Some(self.0.clone()))
    }
}

/// Sends unauthenticated requests.
pub struct NullAuthorizer;

#[async_trait]
impl Authorizer for NullAuthorizer {
    async fn token(&self) -> Result<Option<String>, ClientError> {
        Ok(None)
    }
}

/// Provider namespace, collection and API version of a resource type.
#[derive(Debug, Clone, Copy)]
pub struct ResourceType {
    pub provider: &'static str,
    pub collection: &'static str,
    pub api_version: &'static str,
    /// Prefix for operation names in error messages.
    pub client_name: &'static str,
}

impl ResourceType {
    fn operation(&self, op: &str) -> String {
        format!("{}#{}", self.client_name, op)
    }
}

/// A resource body that can be sent to and read from the API.
pub trait ArmResource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TYPE: ResourceType;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

/// Connection to the Resource Manager endpoint for one subscription.
#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    base_url: String,
    subscription_id: String,
    authorizer: Arc<dyn Authorizer>,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(subscription_id: impl Into<String>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            subscription_id: subscription_id.into(),
            authorizer,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// URL of `name` in `resource_group`.
    pub fn resource_url(&self, rt: &ResourceType, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}?api-version={}",
            self.base_url,
            self.subscription_id,
            resource_group,
            rt.provider,
            rt.collection,
            name,
            rt.api_version
        )
    }

    /// Send a request under `ctx` with credentials and tracing headers.
    pub(crate) async fn send(
        &self,
        ctx: &Context,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let mut request = request
            .header(USER_AGENT, user_agent())
            .header(CLIENT_REQUEST_ID, Uuid::new_v4().to_string());
        if let Some(token) = ctx.run(self.authorizer.token()).await? {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        ctx.run(async {
            request.send().await.map_err(|source| ClientError::Transport {
                operation: operation.to_string(),
                source,
            })
        })
        .await
    }

    /// Turn a non-success response into an API error. The body is read
    /// under `ctx`; a stalled body yields the context's error instead.
    pub(crate) async fn error_from_response(
        &self,
        ctx: &Context,
        operation: &str,
        response: Response,
    ) -> ClientError {
        let status = response.status();
        let body = match ctx.run(async { Ok::<_, ClientError>(response.text().await) }).await {
            Ok(body) => body.unwrap_or_default(),
            Err(err) => return err,
        };

        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.error.message.is_empty() => {
                (parsed.error.code, parsed.error.message)
            }
            Ok(parsed) => (parsed.error.code, reason(status)),
            Err(_) if !body.trim().is_empty() => (None, body.trim().to_string()),
            Err(_) => (None, reason(status)),
        };

        ClientError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            code,
            message,
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        operation: &str,
        response: Response,
    ) -> Result<T, ClientError> {
        let body = ctx
            .run(async {
                response.bytes().await.map_err(|source| ClientError::Transport {
                    operation: operation.to_string(),
                    source,
                })
            })
            .await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    pub async fn get_resource<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        rt: &ResourceType,
        resource_group: &str,
        name: &str,
    ) -> Result<T, ClientError> {
        let operation = rt.operation("Get");
        let url = self.resource_url(rt, resource_group, name);
        let response = self.send(ctx, &operation, self.http.get(&url)).await?;
        if !response.status().is_success() {
            return Err(self.error_from_response(ctx, &operation, response).await);
        }
        self.read_json(ctx, &operation, response).await
    }

    /// PUT `value`, wait for the operation, then read back the result.
    pub async fn put_resource<T: Serialize + Sync>(
        &self,
        ctx: &Context,
        rt: &ResourceType,
        resource_group: &str,
        name: &str,
        value: &T,
    ) -> Result<(), ClientError> {
        let operation = rt.operation("CreateOrUpdate");
        let url = self.resource_url(rt, resource_group, name);
        let response = self
            .send(ctx, &operation, self.http.request(Method::PUT, &url).json(value))
            .await?;

        self.wait_for_completion(ctx, &operation, response).await?;

        // Result resolution: the provider may report success on the
        // operation while the resource itself ended up failed.
        let result: serde_json::Value = self.get_resource(ctx, rt, resource_group, name).await?;
        let state = result
            .pointer("/properties/provisioningState")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if state.eq_ignore_ascii_case("failed") {
            return Err(ClientError::OperationFailed {
                operation,
                status: state.to_string(),
                code: None,
                message: format!("{name} provisioning failed"),
            });
        }
        Ok(())
    }

    /// DELETE and wait. A 404 is returned untouched as an API error.
    pub async fn delete_resource(
        &self,
        ctx: &Context,
        rt: &ResourceType,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let operation = rt.operation("Delete");
        let url = self.resource_url(rt, resource_group, name);
        let response = self
            .send(ctx, &operation, self.http.request(Method::DELETE, &url))
            .await?;

        self.wait_for_completion(ctx, &operation, response).await
    }

    async fn wait_for_completion(
        &self,
        ctx: &Context,
        operation: &str,
        response: Response,
    ) -> Result<(), ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(self.error_from_response(ctx, operation, response).await);
        }

        match OperationHandle::from_headers(response.headers()) {
            Some(handle) => {
                debug!(operation = %operation, status = %status, "Waiting for long-running operation");
                let delay = retry_after(response.headers());
                Poller::new(self, operation, handle, delay).wait(ctx).await
            }
            None if status == StatusCode::ACCEPTED => Err(ClientError::InvalidResponse {
                operation: operation.to_string(),
                message: "202 Accepted without a polling URL".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

/// Typed adapter for one resource kind.
pub struct ArmResourceClient<V> {
    arm: ArmClient,
    _kind: PhantomData<fn() -> V>,
}

impl<V> ArmResourceClient<V> {
    pub fn new(arm: ArmClient) -> Self {
        Self {
            arm,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<V: ArmResource> ResourceClient<V> for ArmResourceClient<V> {
    async fn get(&self, ctx: &Context, resource_group: &str, name: &str) -> Result<V, ClientError> {
        self.arm.get_resource(ctx, &V::TYPE, resource_group, name).await
    }

    async fn create_or_update(
        &self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
        value: V,
    ) -> Result<(), ClientError> {
        self.arm
            .put_resource(ctx, &V::TYPE, resource_group, name, &value)
            .await
    }

    async fn delete(
        &self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        self.arm
            .delete_resource(ctx, &V::TYPE, resource_group, name)
            .await
    }
}
