//! Provider process entrypoint: runs the polling loop and the payment-gated
//! HTTP server concurrently (spec section 4.6: "two concurrent activities").

use dotenvy::dotenv;
use marketplace_ledger::RpcLedgerClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::poller::{self, PollerConfig};
use crate::replay_cache::ReplayCache;
use crate::service::EchoServiceHandler;
use crate::sig_down::SigDown;

pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load();
    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();

    let price_minor = config
        .price_usdc
        .to_minor_units(config.token_decimals)
        .ok_or_else(|| anyhow::anyhow!("price_usdc out of range for {} decimals", config.token_decimals))?;

    let ledger = RpcLedgerClient::try_from(config.ledger_rpc_url.as_str())
        .map_err(|e| anyhow::anyhow!("invalid ledger_rpc_url: {e}"))?;

    let state = Arc::new(AppState {
        ledger,
        replay_cache: ReplayCache::new(config.replay_ttl_secs),
        service_handler: Arc::new(EchoServiceHandler),
        wallet_address: config.wallet_address.clone(),
        price_minor,
        token_mint: config.token_mint.clone(),
        network: config.network.clone(),
        facilitator_url: config.facilitator_url.clone(),
        challenge_ttl_secs: config.challenge_ttl_secs,
    });

    let poller_config = PollerConfig {
        registry_url: config.registry_url.clone(),
        agent_id: config.agent_id.clone(),
        task_type: config.task_type.clone(),
        price_usdc: config.price_usdc,
        estimated_delivery_ms: config.estimated_delivery_ms,
        confidence_score: config.bid_confidence,
        bid_validity_secs: config.bid_validity_secs,
        poll_interval: Duration::from_secs(config.poll_interval_secs),
    };
    tokio::spawn(poller::run(poller_config, cancellation_token.clone()));

    let app = handlers::routes(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, agent_id = %config.agent_id, "starting provider");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    Ok(())
}
