//! Generates a single meme without starting the web server.
//!
//!   autoposter --openai-api-key sk-... --finals-dir ./finals

use anyhow::{Context, Result};
use clap::Parser;
use memegen::cli::AutoposterOptions;
use memegen::config::{MemeConfig, setup_logging};
use memegen::pipeline::MemePipeline;
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let options = AutoposterOptions::parse();

    if let Err(err) = setup_logging(options.debug) {
        eprintln!("Logging setup failed: {}", err);
    }

    let config = MemeConfig::from(&options.pipeline);
    let pipeline = MemePipeline::new(&config).context("Failed to set up the meme pipeline")?;
    pipeline
        .ensure_dirs()
        .await
        .context("Failed to create output directories")?;

    info!("Starting meme generation");
    let final_path = pipeline.run().await.context("Meme generation failed")?;
    info!("Meme generated: {}", final_path.display());
    println!("{}", final_path.display());
    Ok(())
}
