//! Deployment configuration.
//!
//! Values come from environment variables; command-line flags override
//! them. Required values are only checked when a command needs them, so
//! `promote list` works without the directive secrets.

use std::path::PathBuf;

use promote_builder::{AuthorizationSettings, BundleConfig, DEFAULT_BUNDLER, DEFAULT_ENTRY};
use promote_sdk::DEFAULT_DIRECTORY_URL;

/// A required setting was not provided.
#[derive(Debug, thiserror::Error)]
#[error("missing required setting `{0}` (set it in the environment or pass the matching flag)")]
pub struct ConfigError(pub &'static str);

/// Deployment settings.
///
/// Not `Debug`: it holds the operator's password.
#[derive(Clone)]
pub struct DeployConfig {
    /// Directory service GraphQL endpoint.
    pub directory_url: String,
    /// Operator identity.
    pub email: Option<String>,
    /// Operator secret.
    pub password: Option<String>,
    /// Backend name to deploy to.
    pub backend: Option<String>,
    /// Schema file.
    pub schema_path: PathBuf,
    /// Public key for the authorization directive.
    pub verification_key: Option<String>,
    /// Client identifier for the authorization directive.
    pub client_id: Option<String>,
    /// Lambda entry point.
    pub lambda_entry: PathBuf,
    /// Bundler program.
    pub bundler: String,
}

impl DeployConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                       | Default                                   |
    /// |--------------------------------|-------------------------------------------|
    /// | `PROMOTE_DIRECTORY_URL`        | `https://cerebro.cloud.dgraph.io/graphql` |
    /// | `PROMOTE_EMAIL`                | required for remote commands              |
    /// | `PROMOTE_PASSWORD`             | required for remote commands              |
    /// | `PROMOTE_BACKEND`              | required for `deploy`                     |
    /// | `PROMOTE_SCHEMA_PATH`          | `schema.graphql`                          |
    /// | `PROMOTE_JWT_VERIFICATION_KEY` | required for schema builds                |
    /// | `PROMOTE_AUTH_CLIENT_ID`       | required for schema builds                |
    /// | `PROMOTE_LAMBDA_ENTRY`         | `src/lambda.ts`                           |
    /// | `PROMOTE_BUNDLER`              | `esbuild`                                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            directory_url: get("PROMOTE_DIRECTORY_URL")
                .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string()),
            email: get("PROMOTE_EMAIL"),
            password: get("PROMOTE_PASSWORD"),
            backend: get("PROMOTE_BACKEND"),
            schema_path: get("PROMOTE_SCHEMA_PATH")
                .map_or_else(|| PathBuf::from("schema.graphql"), PathBuf::from),
            verification_key: get("PROMOTE_JWT_VERIFICATION_KEY"),
            client_id: get("PROMOTE_AUTH_CLIENT_ID"),
            lambda_entry: get("PROMOTE_LAMBDA_ENTRY")
                .map_or_else(|| PathBuf::from(DEFAULT_ENTRY), PathBuf::from),
            bundler: get("PROMOTE_BUNDLER").unwrap_or_else(|| DEFAULT_BUNDLER.to_string()),
        }
    }

    /// Operator identity and secret.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let email = self.email.as_deref().ok_or(ConfigError("PROMOTE_EMAIL"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(ConfigError("PROMOTE_PASSWORD"))?;
        Ok((email, password))
    }

    /// Target backend name.
    pub fn backend(&self) -> Result<&str, ConfigError> {
        self.backend.as_deref().ok_or(ConfigError("PROMOTE_BACKEND"))
    }

    /// Secrets for the authorization directive.
    pub fn authorization(&self) -> Result<AuthorizationSettings, ConfigError> {
        let verification_key = self
            .verification_key
            .clone()
            .ok_or(ConfigError("PROMOTE_JWT_VERIFICATION_KEY"))?;
        let client_id = self
            .client_id
            .clone()
            .ok_or(ConfigError("PROMOTE_AUTH_CLIENT_ID"))?;
        Ok(AuthorizationSettings {
            verification_key,
            client_id,
        })
    }

    /// Bundle configuration for the lambda entry point.
    pub fn bundle(&self, production: bool) -> BundleConfig {
        BundleConfig::new(&self.lambda_entry).with_production(production)
    }
}
