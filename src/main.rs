#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trade_journal_lib::run().await
}
