//! Ledger RPC CLI configuration.

use clap::Parser;
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(name = "marketplace-ledger-rpc")]
#[command(about = "Shared in-memory ledger exposed over HTTP, so the provider and consumer see the same settlement state")]
pub struct Config {
    #[arg(long, env = "LEDGER_RPC_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "LEDGER_RPC_PORT", default_value_t = 8082)]
    pub port: u16,
}

impl Config {
    pub fn load() -> Self {
        Config::parse()
    }
}
