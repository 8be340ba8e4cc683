use gate_service::{build_router, load_service_config, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    let addr = config.addr;
    let state = AppState::from_config(config);

    // Resolve eagerly so a missing secret shows up in the startup log; requests
    // still get a 401 rather than the process exiting.
    if let Err(err) = state.codec.secrets().resolve() {
        tracing::error!(error = %err, "signing secret missing; all guarded routes will refuse requests");
    }

    let app = build_router(state);

    info!(%addr, "starting gate-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
