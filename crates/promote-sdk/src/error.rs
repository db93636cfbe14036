//! SDK error types.
//!
//! Two layers:
//!
//! * [`ClientError`] is what the query/mutation client reports: either the
//!   request never produced a usable response, or the service answered with
//!   a structured `errors` array.
//! * [`SdkError`] is the application-level taxonomy returned by every
//!   directory and admin operation. [`SdkError::from_client`] is the single
//!   normalization point between the two.

use std::fmt;

/// Messages reported by a remote service in one response, kept distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMessages(Vec<String>);

impl RemoteMessages {
    /// Wrap the messages of one response.
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }

    /// Iterate over the messages in the order the service reported them.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// First reported message.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no message was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The messages as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RemoteMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl IntoIterator for RemoteMessages {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Failure reported by [`GraphqlClient`](crate::client::GraphqlClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status and no GraphQL body.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The body was not a GraphQL response of the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The response carried neither `data` nor `errors`.
    #[error("response contained no data")]
    MissingData,

    /// The service returned one or more structured errors.
    #[error("remote error: {0}")]
    Remote(RemoteMessages),
}

/// Error type for all directory and admin operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing input (e.g. empty identity).
    #[error("configuration error: {0}")]
    Config(String),

    /// The service was unreachable or answered with something unusable.
    #[error("transport error: {0}")]
    Transport(ClientError),

    /// The directory service rejected the login.
    #[error("authentication failed: {0}")]
    RemoteAuth(RemoteMessages),

    /// The service returned errors alongside an otherwise well-formed response.
    #[error("request rejected: {0}")]
    RemoteRejected(RemoteMessages),

    /// No backend with the requested name is visible to the operator.
    #[error("backend not found: {name}")]
    NotFound {
        /// Requested backend name.
        name: String,
    },
}

impl SdkError {
    /// Normalize a client failure.
    ///
    /// Structured remote errors become [`SdkError::RemoteRejected`]; every
    /// other failure is a [`SdkError::Transport`].
    pub fn from_client(err: ClientError) -> Self {
        match err {
            ClientError::Remote(messages) => Self::RemoteRejected(messages),
            other => Self::Transport(other),
        }
    }

    /// Remote messages carried by this error, if any.
    pub fn remote_messages(&self) -> Option<&RemoteMessages> {
        match self {
            Self::RemoteAuth(m) | Self::RemoteRejected(m) => Some(m),
            _ => None,
        }
    }

    /// Split into one error per remote message.
    ///
    /// Errors that carry no remote messages are returned unchanged as a
    /// single-element vector.
    pub fn split(self) -> Vec<SdkError> {
        match self {
            Self::RemoteAuth(m) if m.len() > 1 => m
                .into_iter()
                .map(|msg| Self::RemoteAuth(RemoteMessages::new(vec![msg])))
                .collect(),
            Self::RemoteRejected(m) if m.len() > 1 => m
                .into_iter()
                .map(|msg| Self::RemoteRejected(RemoteMessages::new(vec![msg])))
                .collect(),
            other => vec![other],
        }
    }
}

impl From<ClientError> for SdkError {
    fn from(err: ClientError) -> Self {
        Self::from_client(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(items: &[&str]) -> RemoteMessages {
        RemoteMessages::new(items.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn remote_client_error_becomes_rejected() {
        let err = SdkError::from_client(ClientError::Remote(messages(&["schema invalid"])));
        match err {
            SdkError::RemoteRejected(m) => assert_eq!(m.as_slice(), ["schema invalid"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_client_errors_become_transport() {
        let err = SdkError::from_client(ClientError::Malformed("eof".into()));
        assert!(matches!(err, SdkError::Transport(ClientError::Malformed(_))));

        let err: SdkError = ClientError::MissingData.into();
        assert!(matches!(err, SdkError::Transport(ClientError::MissingData)));
    }

    #[test]
    fn split_yields_one_error_per_message() {
        let err = SdkError::RemoteRejected(messages(&["first", "second", "third"]));
        let split = err.split();
        assert_eq!(split.len(), 3);
        let rendered: Vec<String> = split.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "request rejected: first",
                "request rejected: second",
                "request rejected: third",
            ]
        );
    }

    #[test]
    fn split_leaves_other_errors_alone() {
        let split = SdkError::NotFound { name: "prod".into() }.split();
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].to_string(), "backend not found: prod");
    }

    #[test]
    fn remote_messages_accessor() {
        let err = SdkError::RemoteAuth(messages(&["bad password"]));
        assert_eq!(err.remote_messages().and_then(RemoteMessages::first), Some("bad password"));
        assert!(SdkError::Config("x".into()).remote_messages().is_none());
    }
}
