//! Directory service operations: login, backend lookup and lambda upload.

use promote_models::{BackendDescriptor, BundleArtifact, Credential};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::GraphqlClient;
use crate::error::{RemoteMessages, SdkError};
use crate::graphql::Outcome;
use crate::operations::{DEFAULT_TENANT_ID, DEPLOYMENTS, LOGIN, UPDATE_LAMBDA};

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LoginVariables<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginData {
    login: Option<LoginPayload>,
}

#[derive(Deserialize)]
struct LoginPayload {
    token: Option<String>,
}

#[derive(Deserialize)]
struct DeploymentsData {
    deployments: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct UpdateLambdaVariables<'a> {
    input: UpdateLambdaInput<'a>,
}

#[derive(Serialize)]
struct UpdateLambdaInput<'a> {
    #[serde(rename = "deploymentID")]
    deployment_id: &'a str,
    #[serde(rename = "tenantID")]
    tenant_id: u64,
    #[serde(rename = "lambdaScript")]
    lambda_script: String,
}

#[derive(Deserialize)]
struct UpdateLambdaData {
    #[serde(rename = "updateLambda", default)]
    update_lambda: Option<serde_json::Value>,
}

/// Acknowledgement of a lambda upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaAck {
    /// Backend the script was pushed to.
    pub backend_id: String,
    /// Length of the base-64 payload that was sent.
    pub encoded_len: usize,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Exchange an operator identity and secret for a session token.
///
/// Both values must be non-empty. Any service-reported error (bad password,
/// unknown account, ...) is returned as [`SdkError::RemoteAuth`] with the
/// messages untouched. The call is not retried.
pub async fn acquire(
    directory: &GraphqlClient,
    identity: &str,
    secret: &str,
) -> Result<Credential, SdkError> {
    if identity.is_empty() {
        return Err(SdkError::Config("operator identity must not be empty".into()));
    }
    if secret.is_empty() {
        return Err(SdkError::Config("operator secret must not be empty".into()));
    }

    info!(identity, "logging in to directory service");
    let outcome = directory
        .send::<_, LoginData>(
            &LOGIN,
            LoginVariables {
                email: identity,
                password: secret,
            },
        )
        .await
        .map_err(SdkError::from_client)?;

    let data = match outcome {
        Outcome::Data(data) => data,
        Outcome::Errors(messages) => return Err(SdkError::RemoteAuth(messages)),
    };

    let token = data
        .login
        .and_then(|l| l.token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            SdkError::RemoteAuth(RemoteMessages::new(vec![
                "login returned no token".to_string(),
            ]))
        })?;

    Credential::new(token).map_err(|e| SdkError::Config(e.to_string()))
}

/// Fetch every backend visible to the session, in the service's order.
///
/// Entries that do not decode (e.g. a `null` address) are skipped so one
/// broken backend does not hide the others.
pub async fn list(directory: &GraphqlClient) -> Result<Vec<BackendDescriptor>, SdkError> {
    let data: DeploymentsData = directory.execute(&DEPLOYMENTS, serde_json::json!({})).await?;
    debug!(count = data.deployments.len(), "fetched backend listing");
    Ok(decode_listing(data.deployments))
}

fn decode_listing(entries: Vec<serde_json::Value>) -> Vec<BackendDescriptor> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<BackendDescriptor>(entry) {
            Ok(backend) => Some(backend),
            Err(err) => {
                debug!(error = %err, "skipping undecodable backend entry");
                None
            }
        })
        .collect()
}

/// Find the backend called `name`.
///
/// The listing is fetched fresh on every call. When several backends share
/// the name, the first one in listing order is returned.
pub async fn resolve(directory: &GraphqlClient, name: &str) -> Result<BackendDescriptor, SdkError> {
    let backends = list(directory).await?;
    select_by_name(backends, name)
}

/// First-match selection used by [`resolve`].
fn select_by_name(backends: Vec<BackendDescriptor>, name: &str) -> Result<BackendDescriptor, SdkError> {
    let matches = backends.iter().filter(|b| b.name == name).count();
    if matches > 1 {
        debug!(backend = name, matches, "several backends share this name, using the first");
    }

    let backend = backends
        .into_iter()
        .find(|b| b.name == name)
        .ok_or_else(|| SdkError::NotFound {
            name: name.to_string(),
        })?;

    info!(backend = %backend.name, id = %backend.id, "backend resolved");
    Ok(backend)
}

/// Replace the lambda script of backend `backend_id`.
///
/// The bundle is base-64 encoded because the mutation takes a text field.
pub async fn publish_bundle(
    directory: &GraphqlClient,
    backend_id: &str,
    bundle: &BundleArtifact,
) -> Result<LambdaAck, SdkError> {
    let lambda_script = bundle.encode();
    let encoded_len = lambda_script.len();

    info!(id = backend_id, bytes = bundle.len(), encoded_len, "uploading lambda bundle");
    let data: UpdateLambdaData = directory
        .execute(
            &UPDATE_LAMBDA,
            UpdateLambdaVariables {
                input: UpdateLambdaInput {
                    deployment_id: backend_id,
                    tenant_id: DEFAULT_TENANT_ID,
                    lambda_script,
                },
            },
        )
        .await?;
    debug!(response = ?data.update_lambda, "lambda upload acknowledged");

    Ok(LambdaAck {
        backend_id: backend_id.to_string(),
        encoded_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(id: &str, name: &str) -> BackendDescriptor {
        BackendDescriptor {
            id: id.into(),
            name: name.into(),
            admin_url: format!("{id}.example.io"),
            admin_token: None,
            owner: None,
            zone: None,
            mode: None,
            deployment_type: None,
        }
    }

    #[test]
    fn select_returns_first_duplicate() {
        let listing = vec![backend("0x1", "dev"), backend("0x2", "prod"), backend("0x3", "prod")];
        let selected = select_by_name(listing, "prod").unwrap();
        assert_eq!(selected.id, "0x2");
    }

    #[test]
    fn select_requires_exact_name() {
        let listing = vec![backend("0x1", "prod-eu"), backend("0x2", "Prod")];
        let err = select_by_name(listing, "prod").unwrap_err();
        assert!(matches!(err, SdkError::NotFound { name } if name == "prod"));
    }

    #[test]
    fn select_from_empty_listing() {
        assert!(matches!(
            select_by_name(Vec::new(), "prod"),
            Err(SdkError::NotFound { .. })
        ));
    }

    #[test]
    fn listing_skips_entries_that_do_not_decode() {
        let entries = vec![
            serde_json::json!({ "uid": "0x1", "name": "broken", "url": null }),
            serde_json::json!({ "uid": "0x2", "url": "b.example.io" }),
            serde_json::json!({ "uid": "0x3", "name": "prod", "url": "c.example.io", "jwtToken": "t" }),
        ];

        let listing = decode_listing(entries);

        assert_eq!(listing.len(), 1);
        let selected = select_by_name(listing, "prod").unwrap();
        assert_eq!(selected.id, "0x3");
        assert_eq!(selected.admin_token.as_deref(), Some("t"));
    }

    #[test]
    fn lambda_input_uses_wire_field_names() {
        let vars = UpdateLambdaVariables {
            input: UpdateLambdaInput {
                deployment_id: "0x1",
                tenant_id: DEFAULT_TENANT_ID,
                lambda_script: "YQ==".into(),
            },
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "input": { "deploymentID": "0x1", "tenantID": 0, "lambdaScript": "YQ==" }
            })
        );
    }

    #[tokio::test]
    async fn acquire_rejects_empty_inputs_without_network() {
        // Port 1 is never listening; an attempted request would be a transport error.
        let client = GraphqlClient::new(reqwest::Client::new(), "http://127.0.0.1:1/graphql");
        assert!(matches!(
            acquire(&client, "", "pw").await,
            Err(SdkError::Config(_))
        ));
        assert!(matches!(
            acquire(&client, "ops@example.com", "").await,
            Err(SdkError::Config(_))
        ));
    }
}
