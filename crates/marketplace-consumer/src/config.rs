//! Consumer CLI configuration.

use clap::Parser;
use marketplace_types::MoneyAmount;

#[derive(Parser, Debug)]
#[command(name = "marketplace-consumer")]
#[command(about = "Runs one consumer decision loop: broadcast an RFP, collect bids, select, pay, rate")]
pub struct Config {
    #[arg(long, env = "REGISTRY_URL")]
    pub registry_url: String,

    #[arg(long, env = "CONSUMER_AGENT_ID")]
    pub agent_id: String,

    #[arg(long, env = "CONSUMER_WALLET_ADDRESS")]
    pub wallet_address: String,

    #[arg(long, env = "CONSUMER_TASK_TYPE")]
    pub task_type: String,

    /// JSON object of task requirements, e.g. `{"symbol":"SOL/USDC"}`.
    #[arg(long, env = "CONSUMER_REQUIREMENTS", default_value = "{}")]
    pub requirements: String,

    #[arg(long, env = "CONSUMER_MAX_BUDGET_USDC")]
    pub max_budget_usdc: MoneyAmount,

    #[arg(long, env = "CONSUMER_REQUIRED_DELIVERY_MS")]
    pub required_delivery_time_ms: Option<u64>,

    /// `T_bid`: how long to collect bids before evaluating (spec section
    /// 4.7, step 1-3; default 10 s).
    #[arg(long, env = "CONSUMER_BIDDING_WINDOW_SECS", default_value_t = 10)]
    pub bidding_window_secs: u64,

    /// How long beyond the bidding window the RFP itself stays valid.
    #[arg(long, env = "CONSUMER_RFP_LIFETIME_SECS", default_value_t = 3600)]
    pub rfp_lifetime_secs: u64,

    #[arg(long, env = "TOKEN_MINT", default_value = "USDC")]
    pub token_mint: String,

    #[arg(long, env = "TOKEN_DECIMALS", default_value_t = 6)]
    pub token_decimals: u32,

    #[arg(long, env = "NETWORK", default_value = "base-sepolia")]
    pub network: String,

    #[arg(long, env = "FACILITATOR_URL")]
    pub facilitator_url: String,

    #[arg(long, env = "LEDGER_RPC_URL")]
    pub ledger_rpc_url: String,

    /// Maximum number of delivery attempts after the winner is selected
    /// (spec section 4.7: "until either success, terminal failure from C3,
    /// or a configurable attempt cap").
    #[arg(long, env = "CONSUMER_DELIVERY_ATTEMPT_CAP", default_value_t = 3)]
    pub delivery_attempt_cap: u32,
}

impl Config {
    pub fn load() -> Self {
        Config::parse()
    }
}
