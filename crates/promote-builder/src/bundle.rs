//! Lambda bundle build.

use std::path::PathBuf;

use promote_models::BundleArtifact;
use tracing::info;

use crate::compiler::Compiler;
use crate::error::BuildError;
use crate::memfs::MemoryFs;

/// Entry point used when nothing else is configured.
pub const DEFAULT_ENTRY: &str = "src/lambda.ts";
/// Where the bundler's single output file is placed in the memory filesystem.
pub const DEFAULT_OUTPUT_PATH: &str = "/dist/main.js";

/// Fixed entry configuration for one bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Source entry point on disk.
    pub entry: PathBuf,
    /// Output location inside the in-memory filesystem.
    pub output_path: PathBuf,
    /// Minify for production.
    pub production: bool,
}

impl BundleConfig {
    /// Config for `entry` with the default output path, development mode.
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            production: false,
        }
    }

    /// Set production mode.
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY)
    }
}

/// Compile the lambda sources into a [`BundleArtifact`].
///
/// A fresh [`MemoryFs`] is created for this call only. On compiler failure
/// the error is returned as-is and the output path is never read.
pub async fn build_bundle<C: Compiler>(
    compiler: &C,
    config: &BundleConfig,
) -> Result<BundleArtifact, BuildError> {
    info!(
        entry = %config.entry.display(),
        production = config.production,
        "building lambda bundle"
    );

    let bundle = build_into(compiler, config, &mut MemoryFs::new()).await?;
    info!(bytes = bundle.len(), "lambda bundle built");
    Ok(bundle)
}

/// Compile into `fs` and take the output out of it. The output path is only
/// touched once the compiler has succeeded.
async fn build_into<C: Compiler>(
    compiler: &C,
    config: &BundleConfig,
    fs: &mut MemoryFs,
) -> Result<BundleArtifact, BuildError> {
    compiler.compile(config, fs).await?;

    let bytes = fs
        .take(&config.output_path)
        .map_err(|_| BuildError::MissingOutput {
            path: config.output_path.clone(),
        })?;
    Ok(BundleArtifact::new(bytes))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Writes fixed output, optionally failing afterwards.
    struct FakeCompiler {
        output: Vec<u8>,
        fail_with: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeCompiler {
        fn ok(output: &[u8]) -> Self {
            Self {
                output: output.to_vec(),
                fail_with: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(diagnostics: &'static str) -> Self {
            Self {
                output: b"partial".to_vec(),
                fail_with: Some(diagnostics),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Compiler for FakeCompiler {
        async fn compile(&self, config: &BundleConfig, fs: &mut MemoryFs) -> Result<(), BuildError> {
            let previous = self.calls.fetch_add(1, Ordering::SeqCst);
            // Every build must start from an empty filesystem.
            assert!(fs.is_empty(), "build {previous} saw leftover files");
            fs.write(&config.output_path, self.output.clone());
            match self.fail_with {
                Some(diagnostics) => Err(BuildError::Compile {
                    diagnostics: diagnostics.to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    /// Succeeds without writing anything.
    struct SilentCompiler;

    impl Compiler for SilentCompiler {
        async fn compile(&self, _config: &BundleConfig, _fs: &mut MemoryFs) -> Result<(), BuildError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn returns_compiled_output() {
        let compiler = FakeCompiler::ok(b"exports.handler = () => 1;");
        let bundle = build_bundle(&compiler, &BundleConfig::default()).await.unwrap();
        assert_eq!(bundle.as_bytes(), b"exports.handler = () => 1;");
    }

    #[tokio::test]
    async fn compiler_failure_is_build_error() {
        let compiler = FakeCompiler::failing("ERROR: Could not resolve \"./missing\"");
        let err = build_bundle(&compiler, &BundleConfig::default()).await.unwrap_err();
        match err {
            BuildError::Compile { diagnostics } => {
                assert_eq!(diagnostics, "ERROR: Could not resolve \"./missing\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn output_is_left_alone_when_compile_fails() {
        let compiler = FakeCompiler::failing("ERROR: boom");
        let config = BundleConfig::default();
        let mut fs = MemoryFs::new();

        let err = build_into(&compiler, &config, &mut fs).await.unwrap_err();

        assert!(matches!(err, BuildError::Compile { .. }));
        assert_eq!(fs.read(&config.output_path).unwrap(), b"partial");
        assert_eq!(fs.len(), 1);
    }

    #[tokio::test]
    async fn output_is_taken_after_successful_compile() {
        let compiler = FakeCompiler::ok(b"module.exports = {};");
        let config = BundleConfig::default();
        let mut fs = MemoryFs::new();

        let bundle = build_into(&compiler, &config, &mut fs).await.unwrap();

        assert_eq!(bundle.as_bytes(), b"module.exports = {};");
        assert!(!fs.exists(&config.output_path));
    }

    #[tokio::test]
    async fn missing_output_is_reported() {
        let err = build_bundle(&SilentCompiler, &BundleConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingOutput { path } if path == PathBuf::from(DEFAULT_OUTPUT_PATH)
        ));
    }

    #[tokio::test]
    async fn each_build_gets_its_own_filesystem() {
        let compiler = FakeCompiler::ok(b"x");
        let config = BundleConfig::default();
        let (a, b) = tokio::join!(build_bundle(&compiler, &config), build_bundle(&compiler, &config));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn production_flag() {
        let config = BundleConfig::new("lambda/index.js").with_production(true);
        assert!(config.production);
        assert_eq!(config.output_path, PathBuf::from("/dist/main.js"));
    }
}
