//! Error types for the `promote-models` crate.

/// Errors produced when constructing or decoding model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A lambda script received over the wire was not valid base-64.
    #[error("invalid bundle encoding: {reason}")]
    InvalidBundleEncoding {
        /// Decoder diagnostic.
        reason: String,
    },

    /// The authorization directive could not be rendered.
    #[error("invalid authorization directive: {reason}")]
    InvalidDirective {
        /// Serializer diagnostic.
        reason: String,
    },

    /// A required value was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}
