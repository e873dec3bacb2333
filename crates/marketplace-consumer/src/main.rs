#[tokio::main]
async fn main() -> anyhow::Result<()> {
    marketplace_consumer::run::run().await
}
