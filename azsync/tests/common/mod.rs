//! In-process mock of the Resource Manager API for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use azsync::clients::{ArmClient, StaticToken};
use azsync::{ClusterScope, ClusterScopeParams, Tags};

pub const SUBSCRIPTION: &str = "123";
pub const TOKEN: &str = "test-token";

/// How the mock answers mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Operations finish after `in_progress_polls` polls.
    Normal,
    /// Operations end in `Failed`.
    FailOperation,
    /// Operations never leave `InProgress`.
    NeverComplete,
    /// Every resource request answers 500.
    ServerError,
    /// PUT succeeds but the resource reports `provisioningState: Failed`.
    ProvisioningFailed,
    /// PUT answers 202 with only a Location header.
    LocationPolling,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub api_version: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub client_request_id: Option<String>,
}

struct Operation {
    remaining: u32,
    failed: bool,
}

pub struct MockState {
    base_url: String,
    pub mode: Mode,
    pub in_progress_polls: u32,
    pub resources: HashMap<String, Value>,
    pub requests: Vec<RecordedRequest>,
    pub polls: u32,
    operations: HashMap<u64, Operation>,
    next_operation: u64,
}

impl MockState {
    fn start_operation(&mut self) -> u64 {
        let id = self.next_operation;
        self.next_operation += 1;
        let remaining = match self.mode {
            Mode::NeverComplete => u32::MAX,
            _ => self.in_progress_polls,
        };
        self.operations.insert(
            id,
            Operation {
                remaining,
                failed: self.mode == Mode::FailOperation,
            },
        );
        id
    }

    fn record(&mut self, method: Method, path: String, query: &HashMap<String, String>, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.push(RecordedRequest {
            method,
            path,
            api_version: query.get("api-version").cloned(),
            authorization: header("authorization"),
            user_agent: header("user-agent"),
            client_request_id: header("x-ms-client-request-id"),
        });
    }
}

type Shared = Arc<Mutex<MockState>>;

type ResourcePath = Path<(String, String, String, String, String)>;

fn key(rg: &str, collection: &str, name: &str) -> String {
    format!("{rg}/{collection}/{name}")
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

async fn get_resource(
    State(state): State<Shared>,
    Path((sub, rg, provider, collection, name)): ResourcePath,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    let path = format!("/subscriptions/{sub}/resourceGroups/{rg}/providers/{provider}/{collection}/{name}");
    state.record(Method::GET, path, &query, &headers);

    if state.mode == Mode::ServerError {
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", "Internal Server Error");
    }
    match state.resources.get(&key(&rg, &collection, &name)) {
        Some(value) => Json(value.clone()).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            "ResourceNotFound",
            &format!("The Resource '{provider}/{collection}/{name}' under resource group '{rg}' was not found."),
        ),
    }
}

async fn put_resource(
    State(state): State<Shared>,
    Path((sub, rg, provider, collection, name)): ResourcePath,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let path = format!("/subscriptions/{sub}/resourceGroups/{rg}/providers/{provider}/{collection}/{name}");
    state.record(Method::PUT, path.clone(), &query, &headers);

    if state.mode == Mode::ServerError {
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", "Internal Server Error");
    }

    let provisioning = if state.mode == Mode::ProvisioningFailed { "Failed" } else { "Succeeded" };
    body["id"] = json!(path);
    body["name"] = json!(name);
    if !body["properties"].is_object() {
        body["properties"] = json!({});
    }
    body["properties"]["provisioningState"] = json!(provisioning);
    state.resources.insert(key(&rg, &collection, &name), body.clone());

    let id = state.start_operation();
    if state.mode == Mode::LocationPolling {
        let location = format!("{}/locations/{id}", state.base_url);
        return (
            StatusCode::ACCEPTED,
            [("location", location), ("retry-after", "0".to_string())],
        )
            .into_response();
    }

    let operation = format!("{}/operations/{id}", state.base_url);
    (
        StatusCode::CREATED,
        [("azure-asyncoperation", operation), ("retry-after", "0".to_string())],
        Json(body),
    )
        .into_response()
}

async fn delete_resource(
    State(state): State<Shared>,
    Path((sub, rg, provider, collection, name)): ResourcePath,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    let path = format!("/subscriptions/{sub}/resourceGroups/{rg}/providers/{provider}/{collection}/{name}");
    state.record(Method::DELETE, path, &query, &headers);

    if state.mode == Mode::ServerError {
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", "Internal Server Error");
    }
    if state.resources.remove(&key(&rg, &collection, &name)).is_none() {
        return error_body(StatusCode::NOT_FOUND, "ResourceNotFound", "Resource not found");
    }

    let id = state.start_operation();
    let location = format!("{}/locations/{id}", state.base_url);
    (
        StatusCode::ACCEPTED,
        [("location", location), ("retry-after", "0".to_string())],
    )
        .into_response()
}

async fn operation_status(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut state = state.lock().unwrap();
    state.polls += 1;
    // Stalled operations ask the client to back off so deadlines hit mid-sleep.
    let retry_after = if state.mode == Mode::NeverComplete { "1" } else { "0" };
    let Some(op) = state.operations.get_mut(&id) else {
        return error_body(StatusCode::NOT_FOUND, "OperationNotFound", "Unknown operation");
    };
    if op.remaining > 0 {
        op.remaining -= 1;
        return ([("retry-after", retry_after)], Json(json!({ "status": "InProgress" }))).into_response();
    }
    if op.failed {
        return Json(json!({
            "status": "Failed",
            "error": { "code": "InvalidResourceReference", "message": "Resource referenced by the route table was not found" }
        }))
        .into_response();
    }
    Json(json!({ "status": "Succeeded" })).into_response()
}

async fn location_status(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut state = state.lock().unwrap();
    state.polls += 1;
    let Some(op) = state.operations.get_mut(&id) else {
        return error_body(StatusCode::NOT_FOUND, "OperationNotFound", "Unknown operation");
    };
    if op.remaining > 0 {
        op.remaining -= 1;
        return (StatusCode::ACCEPTED, [("retry-after", "0")]).into_response();
    }
    if op.failed {
        return error_body(StatusCode::CONFLICT, "OperationFailed", "Operation failed");
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Mock Resource Manager bound to a local port.
pub struct MockArm {
    pub addr: SocketAddr,
    pub state: Shared,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockArm {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(Mutex::new(MockState {
            base_url: format!("http://{addr}"),
            mode: Mode::Normal,
            in_progress_polls: 2,
            resources: HashMap::new(),
            requests: Vec::new(),
            polls: 0,
            operations: HashMap::new(),
            next_operation: 1,
        }));

        let router = Router::new()
            .route(
                "/subscriptions/{sub}/resourceGroups/{rg}/providers/{provider}/{collection}/{name}",
                get(get_resource).put(put_resource).delete(delete_resource),
            )
            .route("/operations/{id}", get(operation_status))
            .route("/locations/{id}", get(location_status))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.state.lock().unwrap().mode = mode;
    }

    pub fn insert(&self, rg: &str, collection: &str, name: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .resources
            .insert(key(rg, collection, name), value);
    }

    pub fn resource(&self, rg: &str, collection: &str, name: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&key(rg, collection, name))
            .cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn polls(&self) -> u32 {
        self.state.lock().unwrap().polls
    }

    /// Client pointed at this mock with a short fallback poll interval.
    pub fn client(&self) -> ArmClient {
        ArmClient::new(SUBSCRIPTION, Arc::new(StaticToken::new(TOKEN)))
            .with_base_url(self.base_url())
            .with_poll_interval(Duration::from_millis(10))
    }
}

impl Drop for MockArm {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Cluster scope with the given network ownership tag value.
pub fn scope(ownership: Option<&str>) -> Arc<ClusterScope> {
    let vnet_tags: Tags = ownership
        .map(|value| ("azsync.io_cluster_test-cluster", value))
        .into_iter()
        .collect();
    Arc::new(
        ClusterScope::new(ClusterScopeParams {
            cluster_name: "test-cluster".into(),
            subscription_id: SUBSCRIPTION.into(),
            resource_group: "my-rg".into(),
            location: "westeurope".into(),
            vnet_name: "my-vnet".into(),
            vnet_tags,
            ..Default::default()
        })
        .expect("valid scope"),
    )
}

/// Where [`StallingArm`] stops sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// The PUT itself answers 500 and never finishes its body.
    Submit,
    /// The PUT is accepted; the status monitor answers 500 and stalls.
    Poll,
}

/// Raw HTTP server that sends an error status line and headers, then holds
/// the body open forever.
pub struct StallingArm {
    addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl StallingArm {
    pub async fn spawn(stall: Stall) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_stalling(socket, addr, stall));
            }
        });

        Self { addr, task }
    }

    pub fn client(&self) -> ArmClient {
        ArmClient::new(SUBSCRIPTION, Arc::new(StaticToken::new(TOKEN)))
            .with_base_url(format!("http://{}", self.addr))
            .with_poll_interval(Duration::from_millis(10))
    }
}

impl Drop for StallingArm {
    fn drop(&mut self) {
        self.task.abort();
    }
}

const STALLED_ERROR_HEAD: &str = "HTTP/1.1 500 Internal Server Error\r\n\
    Content-Type: application/json\r\n\
    Content-Length: 1000\r\n\r\n\
    {\"error\": {\"code\": \"Internal";

async fn serve_stalling(mut socket: tokio::net::TcpStream, addr: SocketAddr, stall: Stall) {
    use tokio::io::AsyncWriteExt;

    let mut buf = Vec::new();
    while let Some(request_line) = read_request(&mut socket, &mut buf).await {
        let stalls = match stall {
            Stall::Submit => true,
            Stall::Poll => !request_line.starts_with("PUT "),
        };
        if stalls {
            let _ = socket.write_all(STALLED_ERROR_HEAD.as_bytes()).await;
            let _ = socket.flush().await;
            std::future::pending::<()>().await;
        }

        let accepted = format!(
            "HTTP/1.1 202 Accepted\r\n\
             Azure-AsyncOperation: http://{addr}/operations/1\r\n\
             Retry-After: 0\r\n\
             Content-Length: 0\r\n\r\n"
        );
        if socket.write_all(accepted.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Read one request (head and body) and return its request line.
async fn read_request(socket: &mut tokio::net::TcpStream, buf: &mut Vec<u8>) -> Option<String> {
    use tokio::io::AsyncReadExt;

    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    buf.drain(..head_end + content_length);

    head.lines().next().map(str::to_string)
}
