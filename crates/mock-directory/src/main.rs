//! Standalone fake directory service for local dry runs of `promote`.
//!
//! Seeds one operator account and one backend, then listens on
//! `MOCK_DIRECTORY_PORT` (default `4100`). Point the CLI at it with
//! `PROMOTE_DIRECTORY_URL=http://localhost:4100/graphql`.

use mock_directory::MockDirectory;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MOCK_DIRECTORY_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4100);

    let mock = MockDirectory::new()
        .with_account("ops@example.com", "promote-dev")
        .with_backend("0x1", "dev", Some("dev-backend-token"));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!(address = %addr, "mock directory listening");
    info!("login with ops@example.com / promote-dev, backend name `dev`");
    mock.serve(listener).await.expect("server error");
}
