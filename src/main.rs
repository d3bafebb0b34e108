#[tokio::main]
async fn main() -> anyhow::Result<()> {
    prenota::cli::run().await
}
