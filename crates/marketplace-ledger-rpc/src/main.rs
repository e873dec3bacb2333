#[tokio::main]
async fn main() -> anyhow::Result<()> {
    marketplace_ledger_rpc::run::run().await
}
