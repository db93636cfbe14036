mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use promote_builder::{build_schema, CommandCompiler};
use promote_sdk::{directory, ClientFactory, Endpoints};
use tracing::error;

use crate::config::DeployConfig;
use crate::pipeline::{DeployPlan, Pipeline, PipelineError, SchemaPlan};

#[derive(Parser, Debug)]
#[command(name = "promote")]
#[command(about = "Deploy a GraphQL schema and lambda bundle to a hosted backend")]
struct Cli {
    /// Directory service endpoint (overrides PROMOTE_DIRECTORY_URL).
    #[arg(long, global = true)]
    directory_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build both artifacts and publish them to a backend.
    Deploy {
        /// Backend name (overrides PROMOTE_BACKEND).
        #[arg(long)]
        backend: Option<String>,

        /// Schema file (overrides PROMOTE_SCHEMA_PATH).
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Lambda entry point (overrides PROMOTE_LAMBDA_ENTRY).
        #[arg(long)]
        entry: Option<PathBuf>,

        /// Minify the lambda bundle.
        #[arg(long, default_value_t = false)]
        production: bool,

        /// Leave the backend's schema untouched.
        #[arg(long, default_value_t = false, conflicts_with = "skip_lambda")]
        skip_schema: bool,

        /// Leave the backend's lambda script untouched.
        #[arg(long, default_value_t = false)]
        skip_lambda: bool,
    },

    /// List the backends visible to the operator.
    List,

    /// Print the schema with its authorization directive, without deploying.
    Schema {
        /// Schema file (overrides PROMOTE_SCHEMA_PATH).
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DeployConfig::from_env();
    if let Some(url) = cli.directory_url {
        config.directory_url = url;
    }

    match cli.command {
        Command::Deploy {
            backend,
            schema,
            entry,
            production,
            skip_schema,
            skip_lambda,
        } => {
            if let Some(backend) = backend {
                config.backend = Some(backend);
            }
            if let Some(schema) = schema {
                config.schema_path = schema;
            }
            if let Some(entry) = entry {
                config.lambda_entry = entry;
            }
            deploy(&config, production, skip_schema, skip_lambda).await
        }
        Command::List => list(&config).await,
        Command::Schema { schema } => {
            if let Some(schema) = schema {
                config.schema_path = schema;
            }
            let artifact = build_schema(&config.schema_path, &config.authorization()?).await?;
            print!("{}", artifact.as_str());
            Ok(())
        }
    }
}

async fn deploy(
    config: &DeployConfig,
    production: bool,
    skip_schema: bool,
    skip_lambda: bool,
) -> Result<()> {
    let (identity, secret) = config.credentials()?;
    let schema = if skip_schema {
        None
    } else {
        Some(SchemaPlan {
            path: config.schema_path.clone(),
            auth: config.authorization()?,
        })
    };
    let plan = DeployPlan {
        identity: identity.to_string(),
        secret: secret.to_string(),
        backend: config.backend()?.to_string(),
        schema,
        bundle: (!skip_lambda).then(|| config.bundle(production)),
    };

    let factory = ClientFactory::new(Endpoints::new(config.directory_url.clone()));
    let pipeline = Pipeline::new(factory, CommandCompiler::new(config.bundler.clone()));

    let report = match pipeline.deploy(&plan).await {
        Ok(report) => report,
        Err(err) => return fail(err),
    };

    println!(
        "{} ({}): schema {}, lambda {}",
        report.backend_name,
        report.backend_id,
        track_status(report.schema.as_ref()),
        track_status(report.lambda.as_ref()),
    );
    match report.into_first_error() {
        Some(err) => fail(err),
        None => Ok(()),
    }
}

fn track_status<T, E>(outcome: Option<&Result<T, E>>) -> &'static str {
    match outcome {
        None => "skipped",
        Some(Ok(_)) => "updated",
        Some(Err(_)) => "failed",
    }
}

/// Report every message of `err`, then stop.
fn fail(err: PipelineError) -> Result<()> {
    let messages = err.messages();
    for message in &messages {
        error!("{message}");
    }
    bail!("deployment failed with {} error(s)", messages.len())
}

async fn list(config: &DeployConfig) -> Result<()> {
    let (identity, secret) = config.credentials()?;
    let factory = ClientFactory::new(Endpoints::new(config.directory_url.clone()));

    let token = directory::acquire(&factory.directory(), identity, secret).await?;
    let backends = directory::list(&factory.directory_client(&token)).await?;

    for backend in backends {
        println!(
            "{:<24} {:<12} {:<12} {}",
            backend.name,
            backend.id,
            backend.zone.as_deref().unwrap_or("-"),
            backend.admin_url
        );
    }
    Ok(())
}
