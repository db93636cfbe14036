//! Deployment pipeline: authenticate, resolve, then build and publish the
//! schema and lambda tracks concurrently.
//!
//! ```text
//! acquire ─► resolve ─┬─► build_schema ─► publish_schema   (admin endpoint)
//!                     └─► build_bundle ─► publish_bundle   (directory)
//! ```
//!
//! No stage retries or recovers. A failure aborts its own track only; the
//! other track still runs to completion and both outcomes are reported.
//! Whether a failed track fails the whole run is up to the caller.

use std::path::PathBuf;

use promote_builder::{
    build_bundle, build_schema, AuthorizationSettings, BuildError, BundleConfig, Compiler,
};
use promote_sdk::{
    admin, directory, BackendDescriptor, ClientFactory, GraphqlClient, LambdaAck, SchemaAck,
    SdkError,
};
use tracing::{info, warn};

use crate::config::ConfigError;

/// Any failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required setting is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] SdkError),

    /// An artifact could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl PipelineError {
    /// Operator-facing messages, one per remote-reported error.
    pub fn messages(self) -> Vec<String> {
        match self {
            Self::Remote(err) => err.split().iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

/// Schema track inputs.
#[derive(Debug, Clone)]
pub struct SchemaPlan {
    /// Schema file.
    pub path: PathBuf,
    /// Directive secrets.
    pub auth: AuthorizationSettings,
}

/// What a run deploys, and where.
#[derive(Clone)]
pub struct DeployPlan {
    /// Operator identity.
    pub identity: String,
    /// Operator secret.
    pub secret: String,
    /// Backend name.
    pub backend: String,
    /// Schema track; skipped when `None`.
    pub schema: Option<SchemaPlan>,
    /// Lambda track; skipped when `None`.
    pub bundle: Option<BundleConfig>,
}

/// Outcome of one track: `None` when skipped.
pub type TrackOutcome<T> = Option<Result<T, PipelineError>>;

/// Per-track outcomes of a run that got as far as resolving the backend.
#[derive(Debug)]
pub struct DeployReport {
    /// Backend identifier.
    pub backend_id: String,
    /// Backend name.
    pub backend_name: String,
    /// Schema track outcome.
    pub schema: TrackOutcome<SchemaAck>,
    /// Lambda track outcome.
    pub lambda: TrackOutcome<LambdaAck>,
}

impl DeployReport {
    /// The first failed track's error, schema track first.
    pub fn into_first_error(self) -> Option<PipelineError> {
        self.schema
            .and_then(Result::err)
            .or_else(|| self.lambda.and_then(Result::err))
    }
}

/// Runs deployments with one client factory and one bundler.
pub struct Pipeline<C> {
    factory: ClientFactory,
    compiler: C,
}

impl<C: Compiler + Sync> Pipeline<C> {
    /// Pipeline over `factory` and `compiler`.
    pub fn new(factory: ClientFactory, compiler: C) -> Self {
        Self { factory, compiler }
    }

    /// Execute `plan`.
    ///
    /// Fails outright only when authentication or backend resolution fails.
    /// Track failures are returned inside the [`DeployReport`].
    pub async fn deploy(&self, plan: &DeployPlan) -> Result<DeployReport, PipelineError> {
        let token =
            directory::acquire(&self.factory.directory(), &plan.identity, &plan.secret).await?;
        let session = self.factory.directory_client(&token);

        let backend = directory::resolve(&session, &plan.backend).await?;
        let admin_handle = self.factory.admin_for(&backend);

        let schema_track = async {
            match &plan.schema {
                Some(schema) => Some(self.schema_track(&admin_handle, &backend.name, schema).await),
                None => None,
            }
        };
        let lambda_track = async {
            match &plan.bundle {
                Some(config) => Some(self.lambda_track(&session, &backend, config).await),
                None => None,
            }
        };

        let (schema, lambda) = tokio::join!(schema_track, lambda_track);

        Ok(DeployReport {
            backend_id: backend.id.clone(),
            backend_name: backend.name.clone(),
            schema,
            lambda,
        })
    }

    async fn schema_track(
        &self,
        admin_handle: &GraphqlClient,
        backend_name: &str,
        schema: &SchemaPlan,
    ) -> Result<SchemaAck, PipelineError> {
        let result = match build_schema(&schema.path, &schema.auth).await {
            Ok(artifact) => admin::publish_schema(admin_handle, &artifact)
                .await
                .map_err(PipelineError::from),
            Err(err) => Err(err.into()),
        };
        match &result {
            Ok(_) => info!(backend = backend_name, "schema deployed"),
            Err(err) => warn!(backend = backend_name, error = %err, "schema track failed"),
        }
        result
    }

    async fn lambda_track(
        &self,
        session: &GraphqlClient,
        backend: &BackendDescriptor,
        config: &BundleConfig,
    ) -> Result<LambdaAck, PipelineError> {
        let result = match build_bundle(&self.compiler, config).await {
            Ok(bundle) => directory::publish_bundle(session, &backend.id, &bundle)
                .await
                .map_err(PipelineError::from),
            Err(err) => Err(err.into()),
        };
        match &result {
            Ok(_) => info!(backend = %backend.name, "lambda deployed"),
            Err(err) => warn!(backend = %backend.name, error = %err, "lambda track failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::time::Duration;

    use mock_directory::{MockDirectory, RunningMock};
    use promote_builder::MemoryFs;
    use promote_sdk::{BundleArtifact, Endpoints};

    use super::*;

    const EMAIL: &str = "ops@example.com";
    const PASSWORD: &str = "pw";
    const COMPILED: &[u8] = b"\"use strict\";\nself.addGraphQLResolvers({\"Query.hello\": () => \"hi\"});\n";

    /// Writes [`COMPILED`] after an optional delay, or fails with the given
    /// diagnostics.
    struct StubCompiler {
        fail_with: Option<&'static str>,
        delay: Duration,
    }

    impl StubCompiler {
        fn ok() -> Self {
            Self {
                fail_with: None,
                delay: Duration::ZERO,
            }
        }

        fn failing(diagnostics: &'static str) -> Self {
            Self {
                fail_with: Some(diagnostics),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                fail_with: None,
                delay,
            }
        }
    }

    impl Compiler for StubCompiler {
        async fn compile(&self, config: &BundleConfig, fs: &mut MemoryFs) -> Result<(), BuildError> {
            tokio::time::sleep(self.delay).await;
            match self.fail_with {
                Some(diagnostics) => Err(BuildError::Compile {
                    diagnostics: diagnostics.to_string(),
                }),
                None => {
                    fs.write(&config.output_path, COMPILED);
                    Ok(())
                }
            }
        }
    }

    fn schema_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"type Query { hello: String }\n").unwrap();
        file
    }

    fn plan(schema: &tempfile::NamedTempFile) -> DeployPlan {
        DeployPlan {
            identity: EMAIL.into(),
            secret: PASSWORD.into(),
            backend: "prod".into(),
            schema: Some(SchemaPlan {
                path: schema.path().to_path_buf(),
                auth: AuthorizationSettings {
                    verification_key: "ABC".into(),
                    client_id: "xyz".into(),
                },
            }),
            bundle: Some(BundleConfig::default()),
        }
    }

    async fn start_mock(builder: MockDirectory) -> (RunningMock, ClientFactory) {
        let mock = builder
            .with_account(EMAIL, PASSWORD)
            .with_backend("0x1", "prod", Some("backend-token"))
            .with_backend("0x2", "prod", Some("other-token"))
            .spawn()
            .await
            .unwrap();
        let factory = ClientFactory::new(Endpoints::new(mock.graphql_url()));
        (mock, factory)
    }

    #[tokio::test]
    async fn deploys_both_artifacts_to_first_matching_backend() {
        let (mock, factory) = start_mock(MockDirectory::new()).await;
        let schema = schema_file();

        let report = Pipeline::new(factory, StubCompiler::ok())
            .deploy(&plan(&schema))
            .await
            .unwrap();

        assert_eq!(report.backend_id, "0x1");
        assert!(matches!(report.schema, Some(Ok(_))));
        assert!(matches!(report.lambda, Some(Ok(LambdaAck { ref backend_id, .. })) if backend_id == "0x1"));

        let schemas = mock.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].backend_id, "0x1");
        assert!(schemas[0].schema.starts_with("type Query { hello: String }\n"));
        assert!(schemas[0].schema.contains(r#""Audience":["xyz"]"#));

        let lambdas = mock.lambdas();
        assert_eq!(lambdas.len(), 1);
        assert_eq!(lambdas[0].deployment_id, "0x1");
        assert_eq!(
            BundleArtifact::decode(&lambdas[0].lambda_script).unwrap().as_bytes(),
            COMPILED
        );
    }

    #[tokio::test]
    async fn skipped_tracks_publish_nothing() {
        let (mock, factory) = start_mock(MockDirectory::new()).await;
        let schema = schema_file();
        let plan = DeployPlan {
            bundle: None,
            ..plan(&schema)
        };

        let report = Pipeline::new(factory, StubCompiler::ok())
            .deploy(&plan)
            .await
            .unwrap();

        assert!(report.lambda.is_none());
        assert!(mock.lambdas().is_empty());
        assert_eq!(mock.schemas().len(), 1);
    }

    #[tokio::test]
    async fn compiler_failure_fails_only_the_lambda_track() {
        let (mock, factory) = start_mock(MockDirectory::new()).await;
        let schema = schema_file();

        let report = Pipeline::new(factory, StubCompiler::failing("ERROR: boom"))
            .deploy(&plan(&schema))
            .await
            .unwrap();

        assert!(matches!(report.schema, Some(Ok(_))));
        assert!(matches!(
            report.lambda,
            Some(Err(PipelineError::Build(BuildError::Compile { .. })))
        ));
        assert!(mock.lambdas().is_empty());
        assert_eq!(mock.schemas().len(), 1);
    }

    #[tokio::test]
    async fn schema_rejection_does_not_cancel_a_slower_lambda_track() {
        let (mock, factory) = start_mock(MockDirectory::new().reject_schema(&["schema invalid"])).await;
        let schema = schema_file();

        let report = Pipeline::new(factory, StubCompiler::slow(Duration::from_millis(200)))
            .deploy(&plan(&schema))
            .await
            .unwrap();

        assert!(matches!(report.lambda, Some(Ok(_))));
        assert_eq!(mock.lambdas().len(), 1);
        assert!(mock.schemas().is_empty());
        assert_eq!(
            report.into_first_error().unwrap().messages(),
            ["request rejected: schema invalid"]
        );
    }

    #[tokio::test]
    async fn schema_rejection_surfaces_each_message() {
        let rejecting = MockDirectory::new().reject_schema(&["schema invalid", "unknown type Foo"]);
        let (_mock, factory) = start_mock(rejecting).await;
        let schema = schema_file();
        let plan = DeployPlan {
            bundle: None,
            ..plan(&schema)
        };

        let report = Pipeline::new(factory, StubCompiler::ok())
            .deploy(&plan)
            .await
            .unwrap();

        assert_eq!(
            report.into_first_error().unwrap().messages(),
            ["request rejected: schema invalid", "request rejected: unknown type Foo"]
        );
    }

    #[tokio::test]
    async fn bad_password_stops_before_resolution() {
        let (mock, factory) = start_mock(MockDirectory::new()).await;
        let schema = schema_file();
        let plan = DeployPlan {
            secret: "wrong".into(),
            ..plan(&schema)
        };

        let err = Pipeline::new(factory, StubCompiler::ok())
            .deploy(&plan)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Remote(SdkError::RemoteAuth(_))));
        assert!(mock.schemas().is_empty());
        assert!(mock.lambdas().is_empty());
    }

    #[tokio::test]
    async fn unknown_backend_is_not_found() {
        let (_mock, factory) = start_mock(MockDirectory::new()).await;
        let schema = schema_file();
        let plan = DeployPlan {
            backend: "staging".into(),
            ..plan(&schema)
        };

        let err = Pipeline::new(factory, StubCompiler::ok())
            .deploy(&plan)
            .await
            .unwrap_err();

        assert_eq!(err.messages(), ["backend not found: staging"]);
    }

    #[test]
    fn first_error_prefers_the_schema_track() {
        let report = DeployReport {
            backend_id: "0x1".into(),
            backend_name: "prod".into(),
            schema: Some(Err(PipelineError::Config(ConfigError("PROMOTE_AUTH_CLIENT_ID")))),
            lambda: Some(Err(PipelineError::Build(BuildError::Compile {
                diagnostics: "boom".into(),
            }))),
        };
        assert!(matches!(report.into_first_error(), Some(PipelineError::Config(_))));
    }
}
