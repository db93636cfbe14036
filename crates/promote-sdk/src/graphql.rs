//! GraphQL request and response envelopes.
//!
//! Responses are decoded in two steps: first into an untyped envelope so
//! `errors` can be inspected even when `data` is partial or `null`, then
//! `data` into the operation's typed payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, RemoteMessages};
use crate::operations::Operation;

/// Body of a GraphQL `POST`.
#[derive(Serialize, Debug)]
pub struct GraphqlRequest<'a, V> {
    /// Query or mutation text.
    pub query: &'a str,
    /// Operation variables.
    pub variables: V,
    /// Name of the operation inside `query`.
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
}

impl<'a, V: Serialize> GraphqlRequest<'a, V> {
    /// Build a request for `op`.
    pub fn new(op: &'a Operation, variables: V) -> Self {
        Self {
            query: op.document,
            variables,
            operation_name: op.name,
        }
    }
}

/// One entry of a response's `errors` array.
#[derive(Deserialize, Debug, Clone)]
pub struct GraphqlErrorEntry {
    /// Human-readable message, kept verbatim.
    pub message: String,
}

/// Untyped response envelope.
#[derive(Deserialize, Debug)]
pub struct GraphqlResponse {
    /// Operation result; `null` or absent on failure.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Service-level errors.
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

/// Outcome of one operation: typed data or the service's error messages.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Data(T),
    /// The service reported errors.
    Errors(RemoteMessages),
}

impl GraphqlResponse {
    /// Classify the envelope, decoding `data` into `T`.
    ///
    /// A non-empty `errors` array wins over any `data` that came with it.
    pub fn into_outcome<T: DeserializeOwned>(self) -> Result<Outcome<T>, ClientError> {
        if !self.errors.is_empty() {
            let messages = self.errors.into_iter().map(|e| e.message).collect();
            return Ok(Outcome::Errors(RemoteMessages::new(messages)));
        }
        match self.data {
            None | Some(serde_json::Value::Null) => Err(ClientError::MissingData),
            Some(data) => serde_json::from_value(data)
                .map(Outcome::Data)
                .map_err(|e| ClientError::Malformed(e.to_string())),
        }
    }
}

impl<T> Outcome<T> {
    /// Collapse into a `Result`, mapping remote errors to
    /// [`ClientError::Remote`].
    pub fn into_result(self) -> Result<T, ClientError> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Errors(messages) => Err(ClientError::Remote(messages)),
        }
    }
}
