//! Schema artifacts and the embedded authorization directive.
//!
//! The hosted backend reads a trailing comment line of the form
//!
//! ```text
//! # Dgraph.Authorization {"VerificationKey":"...","Header":"X-Auth-Token","Namespace":"https://dgraph.io/jwt/claims","Algo":"RS256","Audience":["..."]}
//! ```
//!
//! to learn how incoming request tokens must be verified.

use serde::Serialize;

use crate::error::ModelError;

/// Comment prefix the backend scans for.
pub const DIRECTIVE_PREFIX: &str = "# Dgraph.Authorization";
/// Request header carrying end-user tokens.
pub const AUTH_HEADER: &str = "X-Auth-Token";
/// Claims namespace inside end-user tokens.
pub const CLAIMS_NAMESPACE: &str = "https://dgraph.io/jwt/claims";
/// Signature algorithm of end-user tokens.
pub const SIGNING_ALGORITHM: &str = "RS256";

/// Authorization directive appended to the schema.
///
/// Field order is part of the output format; serde keeps declaration order.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorizationDirective {
    verification_key: String,
    header: &'static str,
    namespace: &'static str,
    algo: &'static str,
    audience: Vec<String>,
}

impl AuthorizationDirective {
    /// Build a directive from the public verification key and the client
    /// identifier that becomes the single audience entry.
    pub fn new(verification_key: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            verification_key: verification_key.into(),
            header: AUTH_HEADER,
            namespace: CLAIMS_NAMESPACE,
            algo: SIGNING_ALGORITHM,
            audience: vec![client_id.into()],
        }
    }

    /// Render the directive as a single comment line (no trailing newline).
    ///
    /// The key is JSON-escaped, so multi-line PEM keys stay on one line.
    pub fn to_line(&self) -> Result<String, ModelError> {
        let json = serde_json::to_string(self).map_err(|e| ModelError::InvalidDirective {
            reason: e.to_string(),
        })?;
        Ok(format!("{DIRECTIVE_PREFIX} {json}"))
    }
}

/// Schema text ready to be pushed to an admin endpoint.
///
/// Holds the original schema body followed by one directive line. The body
/// is never modified; if it lacks a trailing newline one is inserted so the
/// directive sits on its own line.
///
/// # Examples
///
/// ```
/// use promote_models::{AuthorizationDirective, SchemaArtifact};
///
/// let artifact = SchemaArtifact::new(
///     "type Query { hello: String }\n",
///     &AuthorizationDirective::new("ABC", "xyz"),
/// )
/// .unwrap();
/// assert!(artifact.as_str().starts_with("type Query { hello: String }\n# Dgraph.Authorization "));
/// assert!(artifact.as_str().contains(r#""Audience":["xyz"]"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaArtifact {
    text: String,
}

impl SchemaArtifact {
    /// Append `directive` to `body`.
    pub fn new(body: &str, directive: &AuthorizationDirective) -> Result<Self, ModelError> {
        let line = directive.to_line()?;
        let mut text = String::with_capacity(body.len() + line.len() + 2);
        text.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&line);
        text.push('\n');
        Ok(Self { text })
    }

    /// Full schema text including the directive.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the artifact, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }
}
