//! Asks a vision model what's going on in a template.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose;
use tracing::{debug, error, info};

use crate::constants::DESCRIPTION_MAX_TOKENS;
use crate::error::MemeError;
use crate::llm::{ChatCompletionRequest, ChatMessage, ContentPart, ImageUrl, OpenAiClient};

/// Instruction sent alongside the image.
pub const DESCRIBE_PROMPT: &str = "Describe this image in detail. What's happening in it? What emotions or situations does it convey? This will be used to generate a meme caption.";

/// MIME type to claim for an image file, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Reads the file and wraps it up as a base64 `data:` URL.
pub async fn image_data_url(path: &Path) -> Result<String, MemeError> {
    let bytes = tokio::fs::read(path).await?;
    let encoded = general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", mime_for_path(path), encoded))
}

/// Rejects an all-whitespace description; anything else is passed on as sent.
fn non_blank(description: String) -> Result<String, MemeError> {
    if description.trim().is_empty() {
        return Err(MemeError::InvalidResponse(
            "vision model returned an empty description".to_string(),
        ));
    }
    Ok(description)
}

/// Describes the image at `image_path`. One request, no retries.
pub async fn describe_image(llm: &OpenAiClient, image_path: &Path) -> Result<String, MemeError> {
    let data_url = image_data_url(image_path).await?;
    let request = ChatCompletionRequest {
        model: llm.vision_model(),
        messages: vec![ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: DESCRIBE_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            },
        ])],
        max_tokens: Some(DESCRIPTION_MAX_TOKENS),
    };

    let description = llm.complete(&request).await.inspect_err(|err| {
        error!("Error analyzing image {}: {}", image_path.display(), err);
    })?;
    let description = non_blank(description)?;

    info!("Image described ({} chars)", description.len());
    debug!("Image analysis: {}", description);
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_is_passed_through_untrimmed() {
        let description = "  a cat staring\n".to_string();
        assert_eq!(
            non_blank(description.clone()).expect("non-blank"),
            description
        );
        assert!(matches!(
            non_blank(" \n\t".to_string()),
            Err(MemeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_path(Path::new("originals/test.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("originals/test.GIF")), "image/gif");
        assert_eq!(mime_for_path(Path::new("originals/test.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("originals/test")), "image/jpeg");
    }

    #[tokio::test]
    async fn data_url_is_base64_of_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.png");
        tokio::fs::write(&path, b"hello").await.expect("write");
        let url = image_data_url(&path).await.expect("data url");
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let config = crate::config::MemeConfig::new("sk-test");
        let llm = OpenAiClient::new(reqwest::Client::new(), &config);
        let result = describe_image(&llm, Path::new("/definitely/not/here.jpg")).await;
        assert!(matches!(result, Err(MemeError::Io(_))));
    }
}
