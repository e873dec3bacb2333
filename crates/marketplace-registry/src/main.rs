#[tokio::main]
async fn main() -> anyhow::Result<()> {
    marketplace_registry::run::run().await
}
