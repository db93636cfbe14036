//! # Promote Builder
//!
//! Produces the two deployable artifacts:
//!
//! * [`build_schema`]: schema file plus trailing authorization directive.
//! * [`build_bundle`]: lambda sources compiled by a [`Compiler`] into a
//!   [`MemoryFs`] and read back as a single script.
//!
//! Neither writes to disk.

pub mod bundle;
pub mod compiler;
pub mod error;
pub mod memfs;
pub mod schema;

pub use bundle::{build_bundle, BundleConfig, DEFAULT_ENTRY, DEFAULT_OUTPUT_PATH};
pub use compiler::{CommandCompiler, Compiler, DEFAULT_BUNDLER};
pub use error::BuildError;
pub use memfs::MemoryFs;
pub use schema::{build_schema, AuthorizationSettings};
