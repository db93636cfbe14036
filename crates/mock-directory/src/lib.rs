//! Fake directory service and per-backend admin endpoints.
//!
//! Speaks just enough of the wire protocol for the promotion pipeline:
//!
//! ```text
//! POST /graphql                 Login | Deployments | UpdateLambda
//! POST /backends/{uid}/admin    UpdateSchema
//! ```
//!
//! Every upload is recorded so tests can assert on what arrived.
//!
//! ```rust,no_run
//! use mock_directory::MockDirectory;
//!
//! # async fn run() -> std::io::Result<()> {
//! let mock = MockDirectory::new()
//!     .with_account("ops@example.com", "pw")
//!     .with_backend("0x1", "prod", Some("backend-token"))
//!     .spawn()
//!     .await?;
//!
//! println!("directory at {}", mock.graphql_url());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use promote_models::{BackendDescriptor, BundleArtifact};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

/// Message returned for a failed login.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";
/// Message returned when a request lacks a valid token.
pub const UNAUTHORIZED: &str = "unauthorized";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A backend registered with the mock.
#[derive(Debug, Clone)]
struct MockBackend {
    uid: String,
    name: String,
    jwt_token: Option<String>,
}

/// Lambda upload as received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaUpload {
    /// `deploymentID` of the mutation.
    pub deployment_id: String,
    /// `tenantID` of the mutation.
    pub tenant_id: u64,
    /// Raw `lambdaScript` value (base-64 text).
    pub lambda_script: String,
}

impl LambdaUpload {
    /// Decode the script back into compiled bytes.
    pub fn decoded(&self) -> Option<Vec<u8>> {
        BundleArtifact::decode(&self.lambda_script)
            .ok()
            .map(|b| b.as_bytes().to_vec())
    }
}

/// Schema upload as received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUpload {
    /// Backend whose admin endpoint received the schema.
    pub backend_id: String,
    /// Schema text.
    pub schema: String,
}

#[derive(Debug, Default)]
struct MockState {
    base_url: String,
    accounts: HashMap<String, String>,
    sessions: HashSet<String>,
    backends: Vec<MockBackend>,
    login_errors: Vec<String>,
    schema_errors: Vec<String>,
    lambda_errors: Vec<String>,
    schemas: Vec<SchemaUpload>,
    lambdas: Vec<LambdaUpload>,
}

impl MockState {
    fn descriptor(&self, backend: &MockBackend) -> BackendDescriptor {
        BackendDescriptor {
            id: backend.uid.clone(),
            name: backend.name.clone(),
            admin_url: format!("{}/backends/{}", self.base_url, backend.uid),
            admin_token: backend.jwt_token.clone(),
            owner: Some("ops@example.com".into()),
            zone: Some("local".into()),
            mode: Some("graphql".into()),
            deployment_type: Some("free".into()),
        }
    }

    fn has_session(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.sessions.contains(token))
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures a mock before it starts listening.
#[derive(Debug, Default)]
pub struct MockDirectory {
    state: MockState,
}

impl MockDirectory {
    /// Empty mock: no accounts, no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `email` / `password` at login.
    #[must_use]
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        self.state
            .accounts
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Register a backend. Listing order follows registration order.
    #[must_use]
    pub fn with_backend(mut self, uid: &str, name: &str, jwt_token: Option<&str>) -> Self {
        self.state.backends.push(MockBackend {
            uid: uid.to_string(),
            name: name.to_string(),
            jwt_token: jwt_token.map(String::from),
        });
        self
    }

    /// Answer every login with these errors, whatever the credentials.
    #[must_use]
    pub fn reject_login(mut self, messages: &[&str]) -> Self {
        self.state.login_errors = messages.iter().map(|m| (*m).to_string()).collect();
        self
    }

    /// Answer every schema update with these errors.
    #[must_use]
    pub fn reject_schema(mut self, messages: &[&str]) -> Self {
        self.state.schema_errors = messages.iter().map(|m| (*m).to_string()).collect();
        self
    }

    /// Answer every lambda update with these errors.
    #[must_use]
    pub fn reject_lambda(mut self, messages: &[&str]) -> Self {
        self.state.lambda_errors = messages.iter().map(|m| (*m).to_string()).collect();
        self
    }

    /// Serve on an already-bound listener until the task is dropped.
    pub async fn serve(mut self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        self.state.base_url = if addr.ip().is_unspecified() {
            format!("http://localhost:{}", addr.port())
        } else {
            format!("http://{addr}")
        };
        let app = router(Arc::new(Mutex::new(self.state)));
        axum::serve(listener, app).await
    }

    /// Bind an ephemeral port on `127.0.0.1` and serve in the background.
    pub async fn spawn(mut self) -> std::io::Result<RunningMock> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.state.base_url = format!("http://{addr}");

        let state = Arc::new(Mutex::new(self.state));
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(RunningMock { addr, state })
    }
}

/// Handle to a mock serving in the background.
#[derive(Clone)]
pub struct RunningMock {
    addr: SocketAddr,
    state: Shared,
}

impl RunningMock {
    /// Socket the mock listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Directory GraphQL endpoint.
    pub fn graphql_url(&self) -> String {
        format!("http://{}/graphql", self.addr)
    }

    /// Base address a backend is listed under.
    pub fn backend_url(&self, uid: &str) -> String {
        format!("http://{}/backends/{uid}", self.addr)
    }

    /// Tokens issued by successful logins.
    pub fn issued_tokens(&self) -> Vec<String> {
        lock(&self.state).sessions.iter().cloned().collect()
    }

    /// Schemas received so far, oldest first.
    pub fn schemas(&self) -> Vec<SchemaUpload> {
        lock(&self.state).schemas.clone()
    }

    /// Lambda scripts received so far, oldest first.
    pub fn lambdas(&self) -> Vec<LambdaUpload> {
        lock(&self.state).lambdas.clone()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Body of a GraphQL `POST`.
#[derive(Deserialize)]
struct GraphqlBody {
    query: String,
    #[serde(default)]
    variables: Value,
    #[serde(rename = "operationName", default)]
    operation_name: Option<String>,
}

impl GraphqlBody {
    fn operation(&self) -> &str {
        match self.operation_name.as_deref() {
            Some(name) => name,
            None if self.query.contains("login(") => "Login",
            None if self.query.contains("deployments") => "Deployments",
            None if self.query.contains("updateLambda") => "UpdateLambda",
            None if self.query.contains("updateGQLSchema") => "UpdateSchema",
            None => "",
        }
    }
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn errors<S: AsRef<str>>(messages: &[S]) -> Response {
    let errors: Vec<Value> = messages
        .iter()
        .map(|m| json!({ "message": m.as_ref() }))
        .collect();
    Json(json!({ "data": null, "errors": errors })).into_response()
}

/// Build the router over shared state.
fn router(state: Shared) -> Router {
    Router::new()
        .route("/graphql", post(directory))
        .route("/backends/{uid}/admin", post(admin))
        .with_state(state)
}

/// `POST /graphql`: directory service operations.
async fn directory(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<GraphqlBody>,
) -> Response {
    let mut state = lock(&state);
    match body.operation() {
        "Login" => {
            if !state.login_errors.is_empty() {
                return errors(&state.login_errors);
            }
            let email = body.variables["email"].as_str().unwrap_or_default();
            let password = body.variables["password"].as_str().unwrap_or_default();
            if state.accounts.get(email).map(String::as_str) != Some(password) {
                info!(email, "login rejected");
                return errors(&[INVALID_CREDENTIALS]);
            }
            let token = uuid::Uuid::new_v4().to_string();
            state.sessions.insert(token.clone());
            info!(email, "login accepted");
            data(json!({ "login": { "token": token } }))
        }
        "Deployments" => {
            if !state.has_session(&headers) {
                return errors(&[UNAUTHORIZED]);
            }
            let listing: Vec<BackendDescriptor> =
                state.backends.iter().map(|b| state.descriptor(b)).collect();
            data(json!({ "deployments": listing }))
        }
        "UpdateLambda" => {
            if !state.has_session(&headers) {
                return errors(&[UNAUTHORIZED]);
            }
            if !state.lambda_errors.is_empty() {
                return errors(&state.lambda_errors);
            }
            let input = &body.variables["input"];
            let upload = LambdaUpload {
                deployment_id: input["deploymentID"].as_str().unwrap_or_default().to_string(),
                tenant_id: input["tenantID"].as_u64().unwrap_or_default(),
                lambda_script: input["lambdaScript"].as_str().unwrap_or_default().to_string(),
            };
            if !state.backends.iter().any(|b| b.uid == upload.deployment_id) {
                return errors(&["deployment not found"]);
            }
            info!(deployment = %upload.deployment_id, "lambda received");
            state.lambdas.push(upload);
            data(json!({ "updateLambda": true }))
        }
        other => errors(&[format!("unknown operation `{other}`")]),
    }
}

/// `POST /backends/{uid}/admin`: per-backend admin endpoint.
async fn admin(
    State(state): State<Shared>,
    Path(uid): Path<String>,
    headers: HeaderMap,
    Json(body): Json<GraphqlBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(backend) = state.backends.iter().find(|b| b.uid == uid).cloned() else {
        return (StatusCode::NOT_FOUND, "no such backend").into_response();
    };

    if let Some(expected) = &backend.jwt_token {
        let presented = headers.get("X-Auth-Token").and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return errors(&[UNAUTHORIZED]);
        }
    }

    if body.operation() != "UpdateSchema" {
        return errors(&[format!("unknown operation `{}`", body.operation())]);
    }
    if !state.schema_errors.is_empty() {
        return errors(&state.schema_errors);
    }

    let schema = body.variables["schema"].as_str().unwrap_or_default().to_string();
    info!(backend = %uid, bytes = schema.len(), "schema received");
    state.schemas.push(SchemaUpload {
        backend_id: uid,
        schema: schema.clone(),
    });
    data(json!({ "updateGQLSchema": { "gqlSchema": { "schema": schema } } }))
}
