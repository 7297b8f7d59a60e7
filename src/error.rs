//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info};

use crate::constants::GENERIC_FAILURE_MESSAGE;

/// Errors raised by the meme pipeline and the web front end.
#[derive(Debug)]
pub enum MemeError {
    /// The request never got a response (DNS, connect, timeout, body read).
    Network(String),
    /// The upstream answered with a non-success status.
    UpstreamStatus {
        /// Which upstream we were talking to
        service: &'static str,
        /// HTTP status returned
        status: u16,
        /// Response body, for the logs
        body: String,
    },
    /// The upstream answered, but not with anything we can use.
    InvalidResponse(String),
    /// No image URL to download.
    MissingImageUrl,
    /// Filesystem failures
    Io(std::io::Error),
    /// The image could not be decoded or encoded.
    Image(String),
    /// The caption font could not be found or parsed.
    Font(String),
    /// When a requested file is not found
    NotFound(String),
    /// When you didn't do the right thing
    BadRequest,
}

impl std::fmt::Display for MemeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::UpstreamStatus {
                service,
                status,
                body,
            } => write!(f, "{service} returned HTTP {status}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
            Self::MissingImageUrl => write!(f, "No image URL provided to download"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Image(msg) => write!(f, "Image error: {msg}"),
            Self::Font(msg) => write!(f, "Font error: {msg}"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::BadRequest => write!(f, "Bad request"),
        }
    }
}

impl std::error::Error for MemeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MemeError {
    fn from(err: std::io::Error) -> Self {
        MemeError::Io(err)
    }
}

impl From<reqwest::Error> for MemeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MemeError::InvalidResponse(err.to_string())
        } else {
            MemeError::Network(err.to_string())
        }
    }
}

impl From<image::ImageError> for MemeError {
    fn from(err: image::ImageError) -> Self {
        MemeError::Image(err.to_string())
    }
}

impl From<url::ParseError> for MemeError {
    fn from(err: url::ParseError) -> Self {
        MemeError::InvalidResponse(format!("bad URL: {err}"))
    }
}

impl From<serde_json::Error> for MemeError {
    fn from(err: serde_json::Error) -> Self {
        MemeError::InvalidResponse(err.to_string())
    }
}

impl From<axum::http::Error> for MemeError {
    fn from(err: axum::http::Error) -> Self {
        MemeError::Io(std::io::Error::other(err))
    }
}

impl IntoResponse for MemeError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MemeError::BadRequest => {
                info!("Bad request received");
                (StatusCode::BAD_REQUEST, "Bad Request").into_response()
            }
            MemeError::NotFound(path) => {
                info!("404 {path}");
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
            other => {
                error!("Internal server error: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// The pipeline stages, in the order they run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Pick a template from the listing API
    FetchTemplate,
    /// Save the template image locally
    DownloadImage,
    /// Ask the vision model what's in it
    DescribeImage,
    /// Ask the text model for a caption
    GenerateCaption,
    /// Burn the caption onto the image
    RenderMeme,
}

impl Stage {
    /// Stages whose failures are reported to clients with the generic message
    /// rather than the underlying error text.
    pub fn reports_generic_failure(self) -> bool {
        matches!(
            self,
            Stage::FetchTemplate | Stage::DownloadImage | Stage::DescribeImage
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::FetchTemplate => "fetch_template",
            Stage::DownloadImage => "download_image",
            Stage::DescribeImage => "describe_image",
            Stage::GenerateCaption => "generate_caption",
            Stage::RenderMeme => "render_meme",
        };
        f.write_str(name)
    }
}

/// A pipeline failure, tagged with the stage it happened in.
#[derive(Debug)]
pub struct PipelineError {
    /// Where it broke
    pub stage: Stage,
    /// What broke
    pub source: MemeError,
}

impl PipelineError {
    /// Tags an error with its stage.
    pub fn new(stage: Stage, source: MemeError) -> Self {
        Self { stage, source }
    }

    /// The message handed back to HTTP clients.
    pub fn client_message(&self) -> String {
        if self.stage.reports_generic_failure() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.source.to_string()
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.source)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> axum::response::Response {
        error!("Meme generation failed: {}", self);
        Json(json!({
            "success": false,
            "error": self.client_message(),
        }))
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_stages_report_generic_message() {
        for stage in [
            Stage::FetchTemplate,
            Stage::DownloadImage,
            Stage::DescribeImage,
        ] {
            let err = PipelineError::new(stage, MemeError::Network("timed out".to_string()));
            assert_eq!(err.client_message(), GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn late_stages_forward_error_text() {
        let err = PipelineError::new(
            Stage::RenderMeme,
            MemeError::Font("no font found".to_string()),
        );
        assert_eq!(err.client_message(), "Font error: no font found");

        let err = PipelineError::new(
            Stage::GenerateCaption,
            MemeError::UpstreamStatus {
                service: "chat completions",
                status: 429,
                body: "slow down".to_string(),
            },
        );
        assert_eq!(
            err.client_message(),
            "chat completions returned HTTP 429: slow down"
        );
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = MemeError::NotFound("finals/nope.jpg".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = MemeError::BadRequest.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
