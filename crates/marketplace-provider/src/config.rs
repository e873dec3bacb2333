//! Provider CLI configuration.

use clap::Parser;
use marketplace_types::MoneyAmount;
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(name = "marketplace-provider")]
#[command(about = "Provider endpoint: polls the registry for matching RFPs and serves a payment-gated /deliver route")]
pub struct Config {
    #[arg(long, env = "PROVIDER_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "PROVIDER_PORT", default_value_t = 8081)]
    pub port: u16,

    #[arg(long, env = "REGISTRY_URL")]
    pub registry_url: String,

    #[arg(long, env = "PROVIDER_AGENT_ID")]
    pub agent_id: String,

    #[arg(long, env = "PROVIDER_WALLET_ADDRESS")]
    pub wallet_address: String,

    /// The single task type this provider bids on (spec section 9: the
    /// source's looser capability taxonomy is normalized here to one
    /// capability per provider process).
    #[arg(long, env = "PROVIDER_TASK_TYPE")]
    pub task_type: String,

    #[arg(long, env = "PROVIDER_PRICE_USDC")]
    pub price_usdc: MoneyAmount,

    #[arg(long, env = "PROVIDER_ESTIMATED_DELIVERY_MS", default_value_t = 1000)]
    pub estimated_delivery_ms: u64,

    /// The provider's own confidence in delivering within its estimate,
    /// in `[0,1]` (spec section 3, `Bid.confidence_score`).
    #[arg(long, env = "PROVIDER_BID_CONFIDENCE", default_value_t = 0.9)]
    pub bid_confidence: f64,

    /// How long a submitted bid stays active before it expires (spec
    /// section 3, `Bid.expires_at`).
    #[arg(long, env = "PROVIDER_BID_VALIDITY_SECS", default_value_t = 300)]
    pub bid_validity_secs: u64,

    #[arg(long, env = "LEDGER_RPC_URL")]
    pub ledger_rpc_url: String,

    #[arg(long, env = "TOKEN_MINT", default_value = "USDC")]
    pub token_mint: String,

    #[arg(long, env = "TOKEN_DECIMALS", default_value_t = 6)]
    pub token_decimals: u32,

    #[arg(long, env = "NETWORK", default_value = "base-sepolia")]
    pub network: String,

    #[arg(long, env = "FACILITATOR_URL")]
    pub facilitator_url: String,

    /// Polling cadence against `GET /rfp/open` (spec section 4.6: "default 3 s").
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 3)]
    pub poll_interval_secs: u64,

    /// TTL for the replay cache; must be >= the ledger's finality window
    /// (spec section 4.6).
    #[arg(long, env = "REPLAY_TTL_SECS", default_value_t = 120)]
    pub replay_ttl_secs: u64,

    /// Challenge lifetime handed out on a 402 response.
    #[arg(long, env = "CHALLENGE_TTL_SECS", default_value_t = 60)]
    pub challenge_ttl_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Config::parse()
    }
}
