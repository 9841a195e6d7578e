#[tokio::main]
async fn main() -> anyhow::Result<()> {
    subpack::cli::run().await
}
