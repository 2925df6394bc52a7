#[tokio::main]
async fn main() -> anyhow::Result<()> {
    auctioneer::start(std::env::args()).await
}
