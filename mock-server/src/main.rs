use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mock_server=info".parse()?))
        .with_target(true)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    if std::env::var_os("TLS").is_some() {
        info!(%addr, "mock server listening (https, self-signed)");
        let acceptor = mock_server::tls::self_signed_acceptor()?;
        mock_server::tls::serve_tls(listener, mock_server::AppState::new(), acceptor).await?;
    } else {
        info!(%addr, "mock server listening");
        mock_server::run(listener).await?;
    }
    Ok(())
}
