use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use rainwatch_mockdev::{build_router, new_state};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let addr: SocketAddr = std::env::var("RAINWATCH_MOCKDEV_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8090".to_string())
        .parse()
        .context("Invalid RAINWATCH_MOCKDEV_ADDR")?;

    let device = new_state();
    let router = build_router(device);

    info!("🌧️ mock rain station listening on http://{addr}");
    info!("toggle rain with: curl -X POST http://{addr}/simulate/rain");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router)
        .await
        .context("Mock device server failed")?;
    Ok(())
}
