#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pairbook_host::run().await
}
