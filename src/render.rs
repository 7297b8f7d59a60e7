//! Burns captions onto templates, classic white-with-black-outline style.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use chrono::{Local, NaiveDateTime};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info};

use crate::caption::{CaptionLines, split_caption};
use crate::constants::{
    BOTTOM_TEXT_OFFSET, CAPTION_FONT_SIZE, CAPTION_STROKE_WIDTH, FONT_CANDIDATES, TOP_TEXT_OFFSET,
};
use crate::error::MemeError;

const FILL: Rgb<u8> = Rgb([255, 255, 255]);
const STROKE: Rgb<u8> = Rgb([0, 0, 0]);

/// `meme_<YYYYMMDD_HHMMSS>.jpg`
pub fn meme_filename(timestamp: &NaiveDateTime) -> String {
    format!("meme_{}.jpg", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Finds the caption font: the explicit path if one is given, otherwise the
/// first well-known system font that exists.
pub fn locate_font(explicit: Option<&Path>) -> Result<PathBuf, MemeError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(MemeError::Font(format!(
            "font file {} does not exist",
            path.display()
        )));
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .ok_or_else(|| {
            MemeError::Font("no caption font found, set MEMEGEN_FONT_PATH".to_string())
        })
}

/// Reads and parses the caption font.
pub fn load_font(explicit: Option<&Path>) -> Result<FontVec, MemeError> {
    let path = locate_font(explicit)?;
    let bytes = std::fs::read(&path)
        .map_err(|err| MemeError::Font(format!("failed to read {}: {}", path.display(), err)))?;
    debug!("Loaded caption font {}", path.display());
    FontVec::try_from_vec(bytes)
        .map_err(|err| MemeError::Font(format!("failed to parse {}: {}", path.display(), err)))
}

/// Where a line of text goes: centered across the image, at row `y`.
/// Lines wider than the image start off the left edge.
pub fn centered_origin(image_width: u32, text_width: u32, y: i32) -> (i32, i32) {
    let x = (i64::from(image_width) - i64::from(text_width)) / 2;
    (x as i32, y)
}

/// Vertical positions of the top and bottom lines. These are fixed offsets,
/// so short images get overlapping or clipped text.
pub fn caption_rows(image_height: u32) -> (i32, i32) {
    let height = i32::try_from(image_height).unwrap_or(i32::MAX);
    (TOP_TEXT_OFFSET, height.saturating_sub(BOTTOM_TEXT_OFFSET))
}

fn draw_outlined_line(canvas: &mut RgbImage, font: &FontVec, text: &str, y: i32) {
    if text.is_empty() {
        return;
    }
    let scale = PxScale::from(CAPTION_FONT_SIZE);
    let (text_width, _) = text_size(scale, font, text);
    let (x, y) = centered_origin(canvas.width(), text_width, y);

    for dx in -CAPTION_STROKE_WIDTH..=CAPTION_STROKE_WIDTH {
        for dy in -CAPTION_STROKE_WIDTH..=CAPTION_STROKE_WIDTH {
            if dx == 0 && dy == 0 {
                continue;
            }
            draw_text_mut(canvas, STROKE, x + dx, y + dy, scale, font, text);
        }
    }
    draw_text_mut(canvas, FILL, x, y, scale, font, text);
}

/// Decodes the template by sniffing its bytes; downloads may carry a `.jpg`
/// name whatever their real format.
pub fn decode_background(path: &Path) -> Result<image::DynamicImage, MemeError> {
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    debug!("Decoding {} as {:?}", path.display(), reader.format());
    Ok(reader.decode()?)
}

/// Draws both caption lines onto an RGB copy of the background.
pub fn compose(background: &image::DynamicImage, lines: &CaptionLines, font: &FontVec) -> RgbImage {
    let mut canvas = background.to_rgb8();
    let (top_y, bottom_y) = caption_rows(canvas.height());
    draw_outlined_line(&mut canvas, font, &lines.top, top_y);
    draw_outlined_line(&mut canvas, font, &lines.bottom, bottom_y);
    canvas
}

/// Renders memes into a directory. Blocking; run it off the async threads.
#[derive(Clone, Debug)]
pub struct MemeRenderer {
    finals_dir: PathBuf,
    font_path: Option<PathBuf>,
}

impl MemeRenderer {
    /// New renderer writing to `finals_dir`.
    pub fn new(finals_dir: impl Into<PathBuf>, font_path: Option<PathBuf>) -> Self {
        Self {
            finals_dir: finals_dir.into(),
            font_path,
        }
    }

    /// Output directory
    pub fn finals_dir(&self) -> &Path {
        &self.finals_dir
    }

    /// Renders `caption` onto `background_path`, named after the current time.
    pub fn render(&self, caption: &str, background_path: &Path) -> Result<PathBuf, MemeError> {
        self.render_at(caption, background_path, &Local::now().naive_local())
    }

    /// Renders with an explicit timestamp for the output name.
    pub fn render_at(
        &self,
        caption: &str,
        background_path: &Path,
        timestamp: &NaiveDateTime,
    ) -> Result<PathBuf, MemeError> {
        let lines = split_caption(caption);
        let background = decode_background(background_path)?;
        let font = load_font(self.font_path.as_deref())?;
        let canvas = compose(&background, &lines, &font);

        std::fs::create_dir_all(&self.finals_dir)?;
        let output_path = self.finals_dir.join(meme_filename(timestamp));
        let mut writer = BufWriter::new(File::create(&output_path)?);
        JpegEncoder::new(&mut writer).encode_image(&canvas)?;
        writer.flush()?;

        info!("Final meme saved to: {}", output_path.display());
        Ok(output_path)
    }
}
