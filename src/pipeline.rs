//! fetch → download → describe → caption → render, one stage at a time.

use std::path::PathBuf;

use tracing::{debug, error, info, instrument};

use crate::caption::generate_caption;
use crate::config::MemeConfig;
use crate::describe::describe_image;
use crate::download::{download_client, save_image};
use crate::error::{MemeError, PipelineError, Stage};
use crate::llm::OpenAiClient;
use crate::render::MemeRenderer;
use crate::templates::fetch_template;

/// Owns the clients and settings a meme run needs.
#[derive(Clone, Debug)]
pub struct MemePipeline {
    http: reqwest::Client,
    downloader: reqwest::Client,
    llm: OpenAiClient,
    renderer: MemeRenderer,
    template_api_url: String,
    originals_dir: PathBuf,
}

trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageExt<T> for Result<T, MemeError> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|err| {
            error!("Stage {} failed: {}", stage, err);
            PipelineError::new(stage, err)
        })
    }
}

impl MemePipeline {
    /// Builds the HTTP clients and wires everything up from config.
    pub fn new(config: &MemeConfig) -> Result<Self, MemeError> {
        let http = reqwest::Client::builder().build()?;
        let downloader = download_client(config.download_timeout)?;
        Ok(Self {
            llm: OpenAiClient::new(http.clone(), config),
            http,
            downloader,
            renderer: MemeRenderer::new(&config.finals_dir, config.font_path.clone()),
            template_api_url: config.template_api_url.clone(),
            originals_dir: config.originals_dir.clone(),
        })
    }

    /// Download directory
    pub fn originals_dir(&self) -> &std::path::Path {
        &self.originals_dir
    }

    /// Render directory
    pub fn finals_dir(&self) -> &std::path::Path {
        self.renderer.finals_dir()
    }

    /// Creates the originals and finals directories if they're missing.
    pub async fn ensure_dirs(&self) -> Result<(), MemeError> {
        tokio::fs::create_dir_all(&self.originals_dir).await?;
        tokio::fs::create_dir_all(self.renderer.finals_dir()).await?;
        Ok(())
    }

    /// Runs the whole pipeline and returns the rendered meme's path.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<PathBuf, PipelineError> {
        let image_url = fetch_template(&self.http, &self.template_api_url)
            .await
            .stage(Stage::FetchTemplate)?;

        let saved_path = save_image(&self.downloader, &image_url, &self.originals_dir)
            .await
            .stage(Stage::DownloadImage)?;

        info!("Analyzing image {}", saved_path.display());
        let description = describe_image(&self.llm, &saved_path)
            .await
            .stage(Stage::DescribeImage)?;

        let caption = generate_caption(&self.llm, &description)
            .await
            .stage(Stage::GenerateCaption)?;

        let renderer = self.renderer.clone();
        let final_path = tokio::task::spawn_blocking(move || renderer.render(&caption, &saved_path))
            .await
            .map_err(|err| MemeError::Io(std::io::Error::other(err)))
            .and_then(|result| result)
            .stage(Stage::RenderMeme)?;

        debug!("Pipeline finished: {}", final_path.display());
        Ok(final_path)
    }
}
