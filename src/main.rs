#[tokio::main]
async fn main() -> anyhow::Result<()> {
    catalog::logging::init();
    catalog::app::run().await
}
