#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfscout_lib::run().await
}
