#[tokio::main]
async fn main() -> Result<(), cadence::error::Run> {
    cadence::client::run().await
}
