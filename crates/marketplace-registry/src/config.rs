//! Registry CLI configuration.

use clap::Parser;
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(name = "marketplace-registry")]
#[command(about = "Registry HTTP API for the agent marketplace")]
pub struct Config {
    #[arg(long, env = "REGISTRY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "REGISTRY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Interval, in seconds, between expiry sweeper ticks (spec section 4.4).
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 5)]
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Config::parse()
    }
}
