#![deny(missing_docs)]

//! # Promote Models
//!
//! Core data types for promoting a backend (schema + lambda bundle) to a
//! hosted managed-backend platform.
//!
//! ## Lifecycle
//!
//! ```text
//! Credential ──► BackendDescriptor ──┬──► SchemaArtifact  ──► admin endpoint
//!                                    └──► BundleArtifact  ──► directory service
//! ```
//!
//! Every value is created fresh for one deployment run and held in memory
//! only.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credential`] | Opaque bearer `Credential` |
//! | [`backend`] | `BackendDescriptor` as listed by the directory service |
//! | [`schema`] | `SchemaArtifact` and its `AuthorizationDirective` |
//! | [`bundle`] | `BundleArtifact` and its base-64 transport encoding |

pub mod backend;
pub mod bundle;
pub mod credential;
pub mod error;
pub mod schema;

// Re-export all public types at crate root for convenience.
pub use backend::*;
pub use bundle::*;
pub use credential::*;
pub use error::*;
pub use schema::*;
