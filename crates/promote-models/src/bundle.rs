//! Compiled lambda bundles.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::ModelError;

/// Single-file lambda script produced by the bundler.
///
/// The directory service receives the script in a text field, so the bytes
/// travel base-64 encoded. [`encode`](Self::encode) and
/// [`decode`](Self::decode) are exact inverses.
///
/// # Examples
///
/// ```
/// use promote_models::BundleArtifact;
///
/// let bundle = BundleArtifact::new(b"module.exports = {};".to_vec());
/// let wire = bundle.encode();
/// assert_eq!(BundleArtifact::decode(&wire).unwrap(), bundle);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    bytes: Vec<u8>,
}

impl BundleArtifact {
    /// Wrap compiled output.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw compiled bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the compiled script in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the compiler produced an empty file.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Transport encoding (standard base-64 alphabet, padded).
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Reverse of [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> Result<Self, ModelError> {
        STANDARD
            .decode(encoded)
            .map(Self::new)
            .map_err(|e| ModelError::InvalidBundleEncoding {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bundle_round_trips() {
        let empty = BundleArtifact::new(Vec::new());
        assert_eq!(empty.encode(), "");
        assert_eq!(BundleArtifact::decode("").unwrap(), empty);
    }

    #[test]
    fn arbitrary_bytes_round_trip() {
        let bytes: Vec<u8> = (0..=255).chain((0..=255).rev()).collect();
        let bundle = BundleArtifact::new(bytes.clone());
        let decoded = BundleArtifact::decode(&bundle.encode()).unwrap();
        assert_eq!(decoded.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn encoding_is_text_safe() {
        let bundle = BundleArtifact::new(vec![0xff, 0x00, b'\n', b'"']);
        let wire = bundle.encode();
        assert!(wire
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = BundleArtifact::decode("not base64!").unwrap_err();
        assert!(matches!(err, ModelError::InvalidBundleEncoding { .. }));
    }
}
