use mock_server::{AuthMode, ServerOptions};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let auth = std::env::var("MOCK_AUTH_MODE")
        .ok()
        .and_then(|raw| AuthMode::parse(&raw))
        .unwrap_or_default();
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, ?auth, "listening");
    mock_server::run_with(
        listener,
        ServerOptions {
            auth,
            ..ServerOptions::default()
        },
    )
    .await
}
