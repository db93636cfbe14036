//! Request handles for the directory service and per-backend admin endpoints.
//!
//! [`ClientFactory`] is the only place handles are made. It is built from an
//! explicit [`Endpoints`] value so tests can point it at a local fake.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use promote_sdk::{directory, ClientFactory, Endpoints};
//!
//! # async fn run() -> Result<(), promote_sdk::SdkError> {
//! let factory = ClientFactory::new(Endpoints::default());
//! let token = directory::acquire(&factory.directory(), "ops@example.com", "hunter2").await?;
//!
//! let session = factory.directory_client(&token);
//! let backend = directory::resolve(&session, "prod").await?;
//! let admin = factory.admin_for(&backend);
//! # let _ = admin;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use promote_models::{admin_endpoint, BackendDescriptor, Credential};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;
use crate::graphql::{GraphqlRequest, GraphqlResponse, Outcome};
use crate::operations::Operation;

/// Directory service used when nothing else is configured.
pub const DEFAULT_DIRECTORY_URL: &str = "https://cerebro.cloud.dgraph.io/graphql";

/// Header carrying the directory session token.
const DIRECTORY_AUTH_HEADER: &str = "authorization";
/// Header carrying a backend-scoped admin token.
const ADMIN_AUTH_HEADER: &str = "X-Auth-Token";

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Credential attached to a handle, with the header it travels in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Directory session: `authorization: Bearer <token>`.
    Bearer(Credential),
    /// Admin endpoint: `X-Auth-Token: <token>`.
    AdminToken(Credential),
}

impl Auth {
    /// Header name this credential is sent under.
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Bearer(_) => DIRECTORY_AUTH_HEADER,
            Self::AdminToken(_) => ADMIN_AUTH_HEADER,
        }
    }

    /// Header value, including the `Bearer` scheme where applicable.
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {}", token.expose()),
            Self::AdminToken(token) => token.expose().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GraphqlClient
// ---------------------------------------------------------------------------

/// Reusable request handle bound to one endpoint and at most one credential.
///
/// Cloning is cheap: the underlying connection pool is shared. A handle is
/// used read-only once requests are in flight; attach a different
/// credential by building a fresh handle rather than mutating a shared one.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: String,
    auth: Option<Auth>,
}

impl GraphqlClient {
    /// Handle for `endpoint` with no credential. Performs no I/O.
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            auth: None,
        }
    }

    /// Attach `auth`, consuming the handle.
    #[must_use]
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Attach or replace the credential on this handle.
    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = Some(auth);
    }

    /// Endpoint every request is posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Currently attached credential.
    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    /// Submit `op` and return its outcome.
    ///
    /// Fails only when no GraphQL response could be obtained; service-level
    /// errors come back as [`Outcome::Errors`].
    pub async fn send<V, T>(&self, op: &Operation, variables: V) -> Result<Outcome<T>, ClientError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let mut req = self
            .http
            .post(self.endpoint.as_str())
            .json(&GraphqlRequest::new(op, variables));
        if let Some(auth) = &self.auth {
            req = req.header(auth.header_name(), auth.header_value());
        }

        debug!(endpoint = %self.endpoint, operation = op.name, "sending request");
        let res = req.send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        match serde_json::from_slice::<GraphqlResponse>(&body) {
            Ok(envelope) if !envelope.errors.is_empty() || status.is_success() => {
                envelope.into_outcome()
            }
            Ok(_) => Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
            Err(_) if !status.is_success() => Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
            Err(e) => Err(ClientError::Malformed(e.to_string())),
        }
    }

    /// Like [`send`](Self::send) but folds remote errors into
    /// [`ClientError::Remote`].
    pub async fn execute<V, T>(&self, op: &Operation, variables: V) -> Result<T, ClientError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        self.send(op, variables).await?.into_result()
    }
}

impl fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth.as_ref().map(Auth::header_name))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Remote service addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// GraphQL endpoint of the directory service.
    pub directory_url: String,
}

impl Endpoints {
    /// Endpoints with a custom directory address.
    pub fn new(directory_url: impl Into<String>) -> Self {
        Self {
            directory_url: directory_url.into(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY_URL)
    }
}

/// Builds request handles. Never performs network I/O itself.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ClientFactory {
    /// Factory for the given endpoints with a fresh connection pool.
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_http(reqwest::Client::new(), endpoints)
    }

    /// Factory sharing an existing `reqwest` client.
    pub fn with_http(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Configured endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Unauthenticated directory handle, used for login.
    pub fn directory(&self) -> GraphqlClient {
        GraphqlClient::new(self.http.clone(), &self.endpoints.directory_url)
    }

    /// Directory handle carrying a session token.
    pub fn directory_client(&self, credential: &Credential) -> GraphqlClient {
        self.directory().with_auth(Auth::Bearer(credential.clone()))
    }

    /// Handle for `<base_url>/admin`, with `token` if one is given.
    pub fn admin_client(&self, base_url: &str, token: Option<Credential>) -> GraphqlClient {
        let client = GraphqlClient::new(self.http.clone(), admin_endpoint(base_url));
        match token {
            Some(token) => client.with_auth(Auth::AdminToken(token)),
            None => client,
        }
    }

    /// Admin handle for a resolved backend. An empty token counts as none.
    pub fn admin_for(&self, backend: &BackendDescriptor) -> GraphqlClient {
        let token = backend
            .admin_token
            .as_deref()
            .and_then(|t| Credential::new(t).ok());
        self.admin_client(&backend.admin_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ClientFactory {
        ClientFactory::new(Endpoints::new("http://127.0.0.1:1/graphql"))
    }

    fn backend(token: Option<&str>) -> BackendDescriptor {
        BackendDescriptor {
            id: "0x1".into(),
            name: "prod".into(),
            admin_url: "prod.example.io".into(),
            admin_token: token.map(String::from),
            owner: None,
            zone: None,
            mode: None,
            deployment_type: None,
        }
    }

    #[test]
    fn default_endpoint_is_hosted_directory() {
        assert_eq!(Endpoints::default().directory_url, DEFAULT_DIRECTORY_URL);
    }

    #[test]
    fn directory_handle_uses_bearer_header() {
        let token = Credential::new("abc").unwrap();
        let client = factory().directory_client(&token);
        let auth = client.auth().unwrap();
        assert_eq!(auth.header_name(), "authorization");
        assert_eq!(auth.header_value(), "Bearer abc");
        assert_eq!(client.endpoint(), "http://127.0.0.1:1/graphql");
    }

    #[test]
    fn anonymous_directory_handle_has_no_auth() {
        assert!(factory().directory().auth().is_none());
    }

    #[test]
    fn admin_handle_uses_x_auth_token() {
        let client = factory().admin_for(&backend(Some("backend-token")));
        assert_eq!(client.endpoint(), "https://prod.example.io/admin");
        let auth = client.auth().unwrap();
        assert_eq!(auth.header_name(), "X-Auth-Token");
        assert_eq!(auth.header_value(), "backend-token");
    }

    #[test]
    fn admin_handle_without_token() {
        assert!(factory().admin_for(&backend(None)).auth().is_none());
        assert!(factory().admin_for(&backend(Some(""))).auth().is_none());
    }

    #[test]
    fn credential_can_be_attached_later() {
        let mut client = factory().directory();
        client.set_auth(Auth::Bearer(Credential::new("late").unwrap()));
        assert_eq!(client.auth().unwrap().header_value(), "Bearer late");
    }

    #[test]
    fn debug_output_hides_token() {
        let client = factory().directory_client(&Credential::new("secret-token").unwrap());
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("authorization"));
    }
}
