mod cli;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = cli::app::run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
