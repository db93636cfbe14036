//! Opaque bearer credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Session token issued by the directory service after a successful login.
///
/// The core assumes nothing about its structure. Its validity window is
/// managed by the issuer, so a credential must not outlive the deployment
/// run that obtained it.
///
/// `Debug` is redacted so a credential can sit inside logged structs
/// without leaking.
///
/// # Examples
///
/// ```
/// use promote_models::Credential;
///
/// let token = Credential::new("eyJhbGciOi...").unwrap();
/// assert_eq!(token.expose(), "eyJhbGciOi...");
/// assert_eq!(format!("{token:?}"), "Credential(***)");
///
/// assert!(Credential::new("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token. Empty tokens are rejected.
    pub fn new(token: impl Into<String>) -> Result<Self, ModelError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ModelError::MissingField {
                field: "token".into(),
            });
        }
        Ok(Self(token))
    }

    /// The raw token, for placing in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
