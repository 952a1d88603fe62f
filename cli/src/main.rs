#[tokio::main]
async fn main() -> anyhow::Result<()> {
    papertrade::run().await
}
