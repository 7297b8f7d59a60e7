//! Config handling

use std::path::PathBuf;
use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::PipelineOptions;
use crate::constants::{
    DEFAULT_CAPTION_MODEL, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_FINALS_DIR, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_ORIGINALS_DIR, DEFAULT_TEMPLATE_API_URL, DEFAULT_VISION_MODEL,
};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the pipeline needs, resolved from the CLI/environment.
#[derive(Clone, Debug)]
pub struct MemeConfig {
    /// API key for the chat completion provider
    pub openai_api_key: String,
    /// Base URL of the chat completion API, without the trailing `/chat/completions`
    pub openai_base_url: String,
    /// Model that describes the template
    pub vision_model: String,
    /// Model that writes the caption
    pub caption_model: String,
    /// Template listing endpoint
    pub template_api_url: String,
    /// Download directory
    pub originals_dir: PathBuf,
    /// Render directory
    pub finals_dir: PathBuf,
    /// Explicit caption font, if any
    pub font_path: Option<PathBuf>,
    /// Timeout for template downloads
    pub download_timeout: Duration,
}

impl MemeConfig {
    /// Default settings with the given API key.
    pub fn new(openai_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            template_api_url: DEFAULT_TEMPLATE_API_URL.to_string(),
            originals_dir: PathBuf::from(DEFAULT_ORIGINALS_DIR),
            finals_dir: PathBuf::from(DEFAULT_FINALS_DIR),
            font_path: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl From<&PipelineOptions> for MemeConfig {
    fn from(cli: &PipelineOptions) -> Self {
        Self {
            openai_api_key: cli.openai_api_key.clone(),
            openai_base_url: cli.openai_base_url.trim_end_matches('/').to_string(),
            vision_model: cli.vision_model.clone(),
            caption_model: cli.caption_model.clone(),
            template_api_url: cli.template_api_url.clone(),
            originals_dir: cli.originals_dir.clone(),
            finals_dir: cli.finals_dir.clone(),
            font_path: cli.font_path.clone(),
            download_timeout: Duration::from_secs(cli.download_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliOptions;
    use clap::Parser;

    #[test]
    fn cli_values_flow_into_config() {
        let cli = CliOptions::try_parse_from([
            "memegen",
            "--openai-api-key",
            "sk-test",
            "--openai-base-url",
            "http://localhost:8080/v1/",
            "--download-timeout-secs",
            "3",
            "--finals-dir",
            "/tmp/finals",
        ])
        .expect("parse cli");
        let config = MemeConfig::from(&cli.pipeline);
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(config.download_timeout, Duration::from_secs(3));
        assert_eq!(config.finals_dir, PathBuf::from("/tmp/finals"));
    }
}
