//! Consumer process entrypoint: runs exactly one decision loop and prints
//! the discriminated outcome to stdout (spec section 7).

use dotenvy::dotenv;
use marketplace_evaluator::DeterministicEvaluator;
use marketplace_facilitator_client::FacilitatorClient;
use marketplace_ledger::RpcLedgerClient;
use marketplace_x402_client::X402Client;
use reqwest::Client;

use crate::config::Config;
use crate::decision_loop;

pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load();
    let facilitator = FacilitatorClient::try_from(config.facilitator_url.as_str())
        .map_err(|e| anyhow::anyhow!("failed to build facilitator client: {e}"))?;
    let ledger = RpcLedgerClient::try_from(config.ledger_rpc_url.as_str())
        .map_err(|e| anyhow::anyhow!("invalid ledger_rpc_url: {e}"))?;
    let x402 = X402Client::new(Client::new(), facilitator, ledger, config.wallet_address.clone());
    let evaluator = DeterministicEvaluator::new();

    let outcome = decision_loop::run(&config, &x402, &evaluator).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.ok {
        std::process::exit(1);
    }
    Ok(())
}
