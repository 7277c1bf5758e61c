#[tokio::main]
async fn main() -> anyhow::Result<()> {
    volume0_daemon::run().await
}
