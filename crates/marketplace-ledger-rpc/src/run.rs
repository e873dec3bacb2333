//! Ledger RPC entrypoint.

use dotenvy::dotenv;
use marketplace_ledger::MemoryLedger;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers;
use crate::sig_down::SigDown;

pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load();
    let ledger = Arc::new(MemoryLedger::new());

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();

    let app = handlers::routes(ledger).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "starting ledger RPC");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    Ok(())
}
