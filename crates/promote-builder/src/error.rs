//! Builder error types.

use std::path::PathBuf;

/// Error type for artifact builds.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The authorization directive could not be rendered.
    #[error(transparent)]
    Directive(#[from] promote_models::ModelError),

    /// The bundler process could not be started.
    #[error("failed to start bundler `{program}`: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The bundler reported a failure.
    #[error("bundle build failed:\n{diagnostics}")]
    Compile {
        /// Diagnostic output of the bundler.
        diagnostics: String,
    },

    /// The bundler succeeded but left nothing at the configured output path.
    #[error("bundler produced no output at {}", path.display())]
    MissingOutput {
        /// Expected output path inside the in-memory filesystem.
        path: PathBuf,
    },
}
