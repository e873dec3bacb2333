#[tokio::main]
async fn main() -> anyhow::Result<()> {
    marketplace_provider::run::run().await
}
