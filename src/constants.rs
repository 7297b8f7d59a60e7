//! Shared constants for the pipeline and the web front end
//!

use std::sync::LazyLock;
use std::time::Duration;

/// Where downloaded templates land
pub const DEFAULT_ORIGINALS_DIR: &str = "originals";

/// Where rendered memes land
pub const DEFAULT_FINALS_DIR: &str = "finals";

/// Imgflip's template listing
pub const DEFAULT_TEMPLATE_API_URL: &str = "https://api.imgflip.com/get_memes";

/// Base URL for the OpenAI-compatible chat completion API
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used to describe the template image.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-mini";

/// Model used to write the caption.
pub const DEFAULT_CAPTION_MODEL: &str = "gpt-4";

/// Response-length cap for the image description.
pub const DESCRIPTION_MAX_TOKENS: u32 = 300;

/// Marker some template sources hand back instead of a URL.
pub const NO_IMAGE_SENTINEL: &str = "No image available";

/// Filename used when the URL has no usable basename.
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "downloaded_image.jpg";

/// Extensions the downloader accepts without appending `.jpg`.
pub const RECOGNIZED_IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Write buffer size used while streaming downloads to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// Timeout for template image downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Caption font size in pixels.
pub const CAPTION_FONT_SIZE: f32 = 70.0;

/// Width of the black outline around caption text.
pub const CAPTION_STROKE_WIDTH: i32 = 2;

/// Distance from the top edge to the top caption.
pub const TOP_TEXT_OFFSET: i32 = 50;

/// Distance from the bottom edge to the bottom caption.
pub const BOTTOM_TEXT_OFFSET: i32 = 150;

/// Places we look for an Impact-ish font when none is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/msttcorefonts/Impact.ttf",
    "/usr/share/fonts/truetype/msttcorefonts/impact.ttf",
    "/usr/share/fonts/TTF/impact.ttf",
    "/Library/Fonts/Impact.ttf",
    "/System/Library/Fonts/Supplemental/Impact.ttf",
    "C:\\Windows\\Fonts\\impact.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
];

/// Message returned when a stage comes back empty-handed.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate meme";

/// Max age (in seconds) for served meme files. They never change once written.
pub const MEME_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60 * 24;

/// Cache-Control value for served memes.
pub static MEME_CACHE_CONTROL: LazyLock<String> =
    LazyLock::new(|| format!("public, max-age={}, immutable", MEME_CACHE_MAX_AGE_SECONDS));
