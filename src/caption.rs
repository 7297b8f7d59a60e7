//! Turns an image description into a two-line caption.

use tracing::info;

use crate::error::MemeError;
use crate::llm::{ChatCompletionRequest, ChatMessage, OpenAiClient};

/// Top and bottom text of a caption.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CaptionLines {
    /// Text drawn near the top edge
    pub top: String,
    /// Text drawn near the bottom edge, empty if the caption had one line
    pub bottom: String,
}

/// Builds the caption prompt for a description.
pub fn caption_prompt(description: &str) -> String {
    format!(
        r#"Based on this image analysis: '{description}'
Generate a funny, relatable meme caption that matches the image's context.
The caption should be split into two parts - a top text and bottom text (but don't actually write 'top text' or 'bottom text' in the caption, just write the text itself), separated by a newline character.
Make it humorous and relevant to what's happening in the image.
IMPORTANT: Use actual newlines, not the text '\n'."#
    )
}

/// Cleans up model output: literal `\n` becomes a line break, and every line
/// is trimmed.
pub fn normalize_caption(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// First line is the top text, second is the bottom text, the rest is dropped.
pub fn split_caption(caption: &str) -> CaptionLines {
    let mut parts = caption.split('\n');
    let top = parts.next().unwrap_or_default().to_string();
    let bottom = parts.next().unwrap_or_default().to_string();
    CaptionLines { top, bottom }
}

/// Asks the caption model for a caption. One request, no retries, and no
/// check that two lines actually came back.
pub async fn generate_caption(llm: &OpenAiClient, description: &str) -> Result<String, MemeError> {
    let request = ChatCompletionRequest {
        model: llm.caption_model(),
        messages: vec![ChatMessage::user_text(caption_prompt(description))],
        max_tokens: None,
    };
    let raw = llm.complete(&request).await?;
    let caption = normalize_caption(&raw);
    info!("Generated caption: {:?}", caption);
    Ok(caption)
}
