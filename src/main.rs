#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pipewatch::bootstrapper::run().await
}
