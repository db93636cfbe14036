//! # Promote SDK
//!
//! Client side of the backend promotion pipeline.
//!
//! The SDK provides:
//!
//! * [`ClientFactory`]: builds [`GraphqlClient`] handles for the directory
//!   service and for per-backend admin endpoints.
//! * [`directory`]: login ([`directory::acquire`]), backend lookup
//!   ([`directory::resolve`]) and lambda upload
//!   ([`directory::publish_bundle`]).
//! * [`admin`]: schema upload ([`admin::publish_schema`]).
//! * [`SdkError`]: unified error type for all remote operations.
//!
//! Data types from [`promote_models`] are re-exported for convenience.

pub mod admin;
pub mod client;
pub mod directory;
pub mod error;
pub mod graphql;
pub mod operations;

pub use admin::SchemaAck;
pub use client::{Auth, ClientFactory, Endpoints, GraphqlClient, DEFAULT_DIRECTORY_URL};
pub use directory::LambdaAck;
pub use error::{ClientError, RemoteMessages, SdkError};
pub use graphql::Outcome;

pub use promote_models::{BackendDescriptor, BundleArtifact, Credential, SchemaArtifact};
