//! Schema build: read the schema file and append the authorization directive.

use std::path::Path;

use promote_models::{AuthorizationDirective, SchemaArtifact};
use tracing::info;

use crate::error::BuildError;

/// Secrets the authorization directive is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationSettings {
    /// Public key (PEM) that verifies end-user tokens.
    pub verification_key: String,
    /// Client identifier used as the token audience.
    pub client_id: String,
}

impl AuthorizationSettings {
    /// Directive for these settings.
    pub fn directive(&self) -> AuthorizationDirective {
        AuthorizationDirective::new(&self.verification_key, &self.client_id)
    }
}

/// Read the schema at `path` and append the authorization directive.
pub async fn build_schema(
    path: impl AsRef<Path>,
    auth: &AuthorizationSettings,
) -> Result<SchemaArtifact, BuildError> {
    let path = path.as_ref();
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let artifact = SchemaArtifact::new(&body, &auth.directive())?;
    info!(
        path = %path.display(),
        bytes = artifact.as_str().len(),
        "schema built"
    );
    Ok(artifact)
}
