//! CLI parser
use clap::{Args, Parser};
use clap::builder::NonEmptyStringValueParser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CAPTION_MODEL, DEFAULT_FINALS_DIR, DEFAULT_OPENAI_BASE_URL, DEFAULT_ORIGINALS_DIR,
    DEFAULT_TEMPLATE_API_URL, DEFAULT_VISION_MODEL,
};

#[derive(Parser, Debug)]
/// CLI Options for the web server
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "MEMEGEN_DEBUG")]
    /// Enable debug logging. Env: MEMEGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5000", env = "MEMEGEN_PORT")]
    /// http listener, defaults to `5000`.
    /// Env: MEMEGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "MEMEGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: MEMEGEN_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(flatten)]
    /// Pipeline settings
    pub pipeline: PipelineOptions,
}

#[derive(Parser, Debug)]
#[command(name = "autoposter")]
/// Generates one meme from the command line and exits.
pub struct AutoposterOptions {
    #[clap(long, help = "Enable debug logging", env = "MEMEGEN_DEBUG")]
    /// Enable debug logging. Env: MEMEGEN_DEBUG
    pub debug: bool,
    #[clap(flatten)]
    /// Pipeline settings
    pub pipeline: PipelineOptions,
}

#[derive(Args, Debug)]
/// Settings shared by everything that runs the meme pipeline.
pub struct PipelineOptions {
    #[clap(
        long,
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    /// API key for the language model provider. Required.
    /// Env: OPENAI_API_KEY
    pub openai_api_key: String,
    #[clap(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    /// Base URL of the chat completion API.
    /// Env: OPENAI_BASE_URL
    pub openai_base_url: String,
    #[clap(long, default_value = DEFAULT_VISION_MODEL, env = "MEMEGEN_VISION_MODEL")]
    /// Model used to describe templates. Env: MEMEGEN_VISION_MODEL
    pub vision_model: String,
    #[clap(long, default_value = DEFAULT_CAPTION_MODEL, env = "MEMEGEN_CAPTION_MODEL")]
    /// Model used to write captions. Env: MEMEGEN_CAPTION_MODEL
    pub caption_model: String,

    #[clap(
        long,
        default_value = DEFAULT_TEMPLATE_API_URL,
        env = "MEMEGEN_TEMPLATE_API_URL"
    )]
    /// Template listing endpoint. Env: MEMEGEN_TEMPLATE_API_URL
    pub template_api_url: String,
    #[clap(long, default_value = DEFAULT_ORIGINALS_DIR, env = "MEMEGEN_ORIGINALS_DIR")]
    /// Where downloaded templates are stored. Env: MEMEGEN_ORIGINALS_DIR
    pub originals_dir: PathBuf,
    #[clap(long, default_value = DEFAULT_FINALS_DIR, env = "MEMEGEN_FINALS_DIR")]
    /// Where rendered memes are stored. Env: MEMEGEN_FINALS_DIR
    pub finals_dir: PathBuf,
    #[clap(long, env = "MEMEGEN_FONT_PATH")]
    /// TrueType/OpenType font for captions, eg `/usr/share/fonts/impact.ttf`.
    /// Falls back to well-known system locations.
    /// Env: MEMEGEN_FONT_PATH
    pub font_path: Option<PathBuf>,
    #[clap(long, default_value = "10", env = "MEMEGEN_DOWNLOAD_TIMEOUT_SECS")]
    /// Template download timeout in seconds. Env: MEMEGEN_DOWNLOAD_TIMEOUT_SECS
    pub download_timeout_secs: u64,
}
