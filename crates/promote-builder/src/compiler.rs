//! Bundler strategy.
//!
//! [`Compiler`] is the seam between the pipeline and whatever turns the
//! lambda sources into a single script. The shipped implementation,
//! [`CommandCompiler`], drives an external bundler process; tests plug in
//! their own.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::bundle::BundleConfig;
use crate::error::BuildError;
use crate::memfs::MemoryFs;

/// Bundler used when nothing else is configured.
pub const DEFAULT_BUNDLER: &str = "esbuild";

/// Compiles the configured entry point into one file inside `fs`.
///
/// Implementations write their single output file to
/// [`BundleConfig::output_path`] and report failures as
/// [`BuildError::Compile`] with the bundler's diagnostics. `fs` is lent
/// exclusively for the duration of the call.
pub trait Compiler {
    /// Run one compilation.
    fn compile(
        &self,
        config: &BundleConfig,
        fs: &mut MemoryFs,
    ) -> impl Future<Output = Result<(), BuildError>> + Send;
}

/// Runs an esbuild-compatible bundler and captures its stdout.
///
/// Invocation: `<program> <entry> --bundle --platform=node --format=cjs
/// [--minify] [extra args...]`. Without `--outfile` the bundle is written to
/// stdout, so nothing touches the disk.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    extra_args: Vec<String>,
}

impl CommandCompiler {
    /// Compiler invoking `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append extra arguments after the fixed ones.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program that will be invoked.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, config: &BundleConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&config.entry)
            .args(["--bundle", "--platform=node", "--format=cjs"]);
        if config.production {
            cmd.arg("--minify");
        }
        cmd.args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_BUNDLER)
    }
}

impl Compiler for CommandCompiler {
    async fn compile(&self, config: &BundleConfig, fs: &mut MemoryFs) -> Result<(), BuildError> {
        debug!(program = %self.program, entry = %config.entry.display(), "spawning bundler");
        let output = self
            .command(config)
            .output()
            .await
            .map_err(|source| BuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            let diagnostics = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(BuildError::Compile { diagnostics });
        }
        if !stderr.is_empty() {
            warn!(program = %self.program, diagnostics = %stderr, "bundler reported warnings");
        }

        fs.write(&config.output_path, output.stdout);
        Ok(())
    }
}
