//! Result image rendering.
//!
//! Turns a justification and the cart into an 800×600 PNG. Split in two:
//! - `layout`: pure, produces positioned text draw calls
//! - `TextPainter` / `PngRenderer`: rasterize the calls and write the file
//!
//! Text is never measured, wrapped or clipped. Nothing here recovers from
//! errors; they go back to the caller as [`RenderError`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use chrono::{DateTime, Local};
use image::{ImageError, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use thiserror::Error;

use crate::fonts;
use crate::report::cart_line;
use crate::types::CartItem;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// MIME type of the artifact, for whoever delivers it.
pub const PNG_MIME: &str = "image/png";

pub const TITLE: &str = "🛒 구매 결과";
pub const ITEMS_HEADER: &str = "📦 구매한 물품:";
pub const REASON_HEADER: &str = "📝 구매 이유:";

const HEADER_X: i32 = 20;
const BODY_X: i32 = 40;
const TITLE_Y: i32 = 20;
const ITEMS_HEADER_Y: i32 = 80;
const HEADER_GAP: i32 = 40;
const ITEM_STEP: i32 = 30;
const SECTION_GAP: i32 = 20;

/// Pixel height of rendered text.
pub const FONT_SIZE: f32 = 20.0;
/// Extra pixels between lines of a multi-line block.
const LINE_SPACING: f32 = 4.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no usable font found; pass --font <PATH>")]
    NoFont,
    #[error("cannot load font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
    #[error("cannot write result image: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode result image: {0}")]
    Encode(String),
}

impl From<ImageError> for RenderError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => RenderError::Io(io),
            other => RenderError::Encode(other.to_string()),
        }
    }
}

// ============================================================================
// LAYOUT (pure)
// ============================================================================

/// One piece of text at a fixed position, top-left anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

impl DrawCall {
    fn new(x: i32, y: i32, text: impl Into<String>) -> Self {
        DrawCall { x, y, text: text.into() }
    }
}

/// Compute the draw calls for a result image, top to bottom.
///
/// Title, items header, one line per cart item, reason header, then the
/// reason as a single block.
pub fn layout(reason: &str, items: &[CartItem]) -> Vec<DrawCall> {
    let mut calls = Vec::with_capacity(items.len() + 4);

    calls.push(DrawCall::new(HEADER_X, TITLE_Y, TITLE));

    let mut y = ITEMS_HEADER_Y;
    calls.push(DrawCall::new(HEADER_X, y, ITEMS_HEADER));
    y += HEADER_GAP;

    for item in items {
        calls.push(DrawCall::new(BODY_X, y, cart_line(item)));
        y += ITEM_STEP;
    }

    y += SECTION_GAP;
    calls.push(DrawCall::new(HEADER_X, y, REASON_HEADER));
    y += HEADER_GAP;
    calls.push(DrawCall::new(BODY_X, y, reason));

    calls
}

/// `result_YYYYMMDD_HHMMSS.png` for the given moment.
pub fn result_filename(at: &DateTime<Local>) -> String {
    format!("result_{}.png", at.format("%Y%m%d_%H%M%S"))
}

// ============================================================================
// RASTERIZING
// ============================================================================

/// Draws one text call onto the canvas.
pub trait TextPainter {
    fn paint(&self, canvas: &mut RgbImage, call: &DrawCall) -> Result<(), RenderError>;
}

/// Glyph rasterizer backed by a TrueType/OpenType font.
pub struct FontPainter {
    font: FontVec,
    scale: PxScale,
}

impl FontPainter {
    /// Load a font file (first face of a collection).
    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let font_err = |reason: String| RenderError::Font {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = fs::read(path).map_err(|e| font_err(e.to_string()))?;
        let font = FontVec::try_from_vec_and_index(bytes, 0).map_err(|e| font_err(e.to_string()))?;
        Ok(FontPainter {
            font,
            scale: PxScale::from(FONT_SIZE),
        })
    }

    /// Use `explicit` if given, otherwise search the system font directories.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, RenderError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = fonts::discover_font().ok_or(RenderError::NoFont)?;
                Self::from_file(&path)
            }
        }
    }

    fn line_height(&self) -> i32 {
        (self.font.as_scaled(self.scale).height() + LINE_SPACING).ceil() as i32
    }
}

impl TextPainter for FontPainter {
    fn paint(&self, canvas: &mut RgbImage, call: &DrawCall) -> Result<(), RenderError> {
        let step = self.line_height();
        let mut y = call.y;
        for line in call.text.split('\n') {
            draw_text_mut(canvas, BLACK, call.x, y, self.scale, &self.font, line);
            y += step;
        }
        Ok(())
    }
}

/// Paint every call onto a fresh white canvas.
pub fn rasterize(calls: &[DrawCall], painter: &dyn TextPainter) -> Result<RgbImage, RenderError> {
    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, WHITE);
    for call in calls {
        painter.paint(&mut canvas, call)?;
    }
    Ok(canvas)
}

// ============================================================================
// RENDERER
// ============================================================================

/// Anything that can turn a submission into an artifact on disk.
pub trait ResultRenderer {
    /// Render and return the path of the written file.
    fn render(&self, reason: &str, items: &[CartItem]) -> Result<PathBuf, RenderError>;
}

/// Writes result PNGs into a directory, the working directory by default.
pub struct PngRenderer<P> {
    painter: P,
    out_dir: PathBuf,
}

impl<P: TextPainter> PngRenderer<P> {
    /// Renderer writing into the current working directory.
    ///
    /// Returned paths are bare file names.
    pub fn new(painter: P) -> Self {
        PngRenderer {
            painter,
            out_dir: PathBuf::new(),
        }
    }

    pub fn with_output_dir(painter: P, out_dir: impl Into<PathBuf>) -> Self {
        PngRenderer {
            painter,
            out_dir: out_dir.into(),
        }
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    /// Render with an explicit timestamp for the file name.
    ///
    /// A second render within the same second overwrites the first.
    pub fn render_at(
        &self,
        reason: &str,
        items: &[CartItem],
        at: &DateTime<Local>,
    ) -> Result<PathBuf, RenderError> {
        let calls = layout(reason, items);
        let canvas = rasterize(&calls, &self.painter)?;

        let path = self.out_dir.join(result_filename(at));
        canvas.save_with_format(&path, ImageFormat::Png)?;

        tracing::info!(path = %path.display(), items = items.len(), "result image written");
        Ok(path)
    }
}

impl<P: TextPainter> ResultRenderer for PngRenderer<P> {
    fn render(&self, reason: &str, items: &[CartItem]) -> Result<PathBuf, RenderError> {
        self.render_at(reason, items, &Local::now())
    }
}

/// Renderer that resolves its font on every render.
///
/// Font problems therefore fail one submission, not the whole session,
/// and a font installed mid-session is picked up on retry.
#[derive(Debug, Clone, Default)]
pub struct SystemFontRenderer {
    font: Option<PathBuf>,
    out_dir: PathBuf,
}

impl SystemFontRenderer {
    /// Write into the working directory, using `font` or a discovered one.
    pub fn new(font: Option<PathBuf>) -> Self {
        SystemFontRenderer {
            font,
            out_dir: PathBuf::new(),
        }
    }

    pub fn with_output_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }
}

impl ResultRenderer for SystemFontRenderer {
    fn render(&self, reason: &str, items: &[CartItem]) -> Result<PathBuf, RenderError> {
        let painter = FontPainter::discover(self.font.as_deref())?;
        PngRenderer::with_output_dir(painter, self.out_dir.clone()).render(reason, items)
    }
}

// ============================================================================
// TEST SUPPORT
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================
