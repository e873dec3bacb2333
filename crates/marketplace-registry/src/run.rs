//! Registry HTTP entrypoint.

use axum::http::Method;
use dotenvy::dotenv;
use marketplace_store::{Store, spawn_expiry_sweeper};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors;
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
    let store = Store::new();

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    spawn_expiry_sweeper(
        store.clone(),
        Duration::from_secs(config.sweep_interval_secs),
        cancellation_token.clone(),
    );

    let app = handlers::routes(store).layer(TraceLayer::new_for_http()).layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "starting registry");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    Ok(())
}
