use clap::Parser;
use memegen::config::{MemeConfig, setup_logging};
use memegen::pipeline::MemePipeline;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // a missing .env is fine, the environment may already be set up
    let _ = dotenvy::dotenv();
    let cli = memegen::cli::CliOptions::parse();

    if let Err(err) = setup_logging(cli.debug) {
        eprintln!("Logging setup failed: {}", err);
    }

    let config = MemeConfig::from(&cli.pipeline);
    let pipeline = match MemePipeline::new(&config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("Failed to set up the meme pipeline: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = memegen::web::setup_server(&cli.listen_address, cli.port, pipeline).await {
        error!("Application error: {}", err);
        std::process::exit(1);
    }
}
