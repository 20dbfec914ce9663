//! Text rendering using fontdue, with a built-in bitmap font fallback.

use embedded_graphics::mono_font::{ascii::FONT_5X8, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use fontdue::FontSettings;
use pishow_hw::MonoFramebuffer;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{RenderConfig, LINE_HEIGHT};

/// System font used when no font file is named.
pub const DEJAVU_SANS_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Pixel size TrueType fonts are rasterized at.
pub const FONT_SIZE: f32 = 9.0;

/// Glyph coverage at or above which a pixel is lit.
const COVERAGE_THRESHOLD: u8 = 128;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("No such font file: {0}")]
    Missing(PathBuf),

    #[error("Unable to load font {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Font used for panel text.
pub enum Font {
    /// 5x8 monospace bitmap font compiled into the binary.
    Builtin,
    /// TrueType font rasterized at a fixed size.
    TrueType { font: fontdue::Font, size: f32 },
}

impl Font {
    /// Loads the named font, or the best available default.
    ///
    /// A named font that does not exist is an error. Without a name,
    /// DejaVuSans is used when installed and the built-in font otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, FontError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(FontError::Missing(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        let system = Path::new(DEJAVU_SANS_PATH);
        if system.exists() {
            match Self::from_file(system) {
                Ok(font) => return Ok(font),
                Err(e) => warn!("{}, using built-in font", e),
            }
        }

        debug!("Using built-in 5x8 font");
        Ok(Font::Builtin)
    }

    fn from_file(path: &Path) -> Result<Self, FontError> {
        let unreadable = |reason: String| FontError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let font = fontdue::Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| unreadable(e.to_string()))?;

        info!("Loaded font {}", path.display());
        Ok(Font::TrueType {
            font,
            size: FONT_SIZE,
        })
    }
}

/// Returns the lines that fit the display, each cut to the character limit.
pub fn select_lines<'a>(lines: &'a [String], config: &RenderConfig) -> Vec<&'a str> {
    lines
        .iter()
        .take(config.max_lines)
        .map(|line| truncate_chars(line, config.max_chars))
        .collect()
}

/// Cuts a string to at most `max_chars` characters.
pub fn truncate_chars(line: &str, max_chars: usize) -> &str {
    match line.char_indices().nth(max_chars) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Text renderer drawing into a 1-bit framebuffer.
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    pub fn new(font: Font) -> Self {
        Self { font }
    }

    /// Draws a block of lines, one fixed-height row each, from column 0.
    pub fn draw_lines(&self, fb: &mut MonoFramebuffer, lines: &[String], config: &RenderConfig) {
        for (row, line) in select_lines(lines, config).into_iter().enumerate() {
            let y = config.padding + (LINE_HEIGHT as i32) * row as i32;
            self.draw_text(fb, 0, y, line);
        }
    }

    /// Draws text with its top-left corner at (x, y).
    pub fn draw_text(&self, fb: &mut MonoFramebuffer, x: i32, y: i32, text: &str) {
        match &self.font {
            Font::Builtin => {
                let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
                let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(fb);
            }
            Font::TrueType { font, size } => draw_truetype(fb, font, *size, x, y, text),
        }
    }
}

fn draw_truetype(fb: &mut MonoFramebuffer, font: &fontdue::Font, size: f32, x: i32, y: i32, text: &str) {
    let mut cursor_x = x;

    for ch in text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, size);

        for glyph_y in 0..metrics.height {
            for glyph_x in 0..metrics.width {
                if bitmap[glyph_y * metrics.width + glyph_x] < COVERAGE_THRESHOLD {
                    continue;
                }
                let px = cursor_x + metrics.xmin + glyph_x as i32;
                let py = y + (size as i32 - metrics.ymin - metrics.height as i32) + glyph_y as i32;
                if px >= 0 && py >= 0 {
                    fb.set_pixel(px as u32, py as u32, true);
                }
            }
        }

        cursor_x += metrics.advance_width.round() as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(max_lines: usize, max_chars: usize) -> RenderConfig {
        RenderConfig {
            max_lines,
            max_chars,
            padding: -2,
            dwell: Duration::ZERO,
        }
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_caps_lines() {
        let input = lines(&["one", "two", "three"]);
        assert_eq!(select_lines(&input, &config(2, 21)), vec!["one", "two"]);
        assert_eq!(select_lines(&input, &config(4, 21)), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_select_truncates_to_prefix() {
        let long = "abcdefghijklmnopqrstuvwxyz".to_string();
        let selected = select_lines(std::slice::from_ref(&long), &config(4, 21));
        assert_eq!(selected, vec![&long[..21]]);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 21), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_missing_font_is_error() {
        let err = Font::load(Some(Path::new("/nonexistent/font.ttf")))
            .err()
            .unwrap();
        assert!(matches!(err, FontError::Missing(_)));
    }

    #[test]
    fn test_invalid_font_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = Font::load(Some(&path)).err().unwrap();
        assert!(matches!(err, FontError::Unreadable { .. }));
    }

    #[test]
    fn test_builtin_draws_only_selected_rows() {
        let renderer = TextRenderer::new(Font::Builtin);
        let mut fb = MonoFramebuffer::new();
        renderer.draw_lines(&mut fb, &lines(&["one", "two", "three"]), &config(2, 21));

        assert!(fb.lit_count() > 0);
        // Two rows at y = -2 and y = 6 end above y = 14.
        assert!(fb.lit_pixels().all(|(_, y)| y < 14));
    }

    fn top_row(fb: &MonoFramebuffer, band: std::ops::Range<u32>) -> Option<u32> {
        fb.lit_pixels()
            .map(|(_, y)| y)
            .filter(|y| band.contains(y))
            .min()
    }

    #[test]
    fn test_rows_are_eight_pixels_apart_from_padding() {
        let renderer = TextRenderer::new(Font::Builtin);

        let mut single = MonoFramebuffer::with_dimensions(128, 64);
        let mut base = config(1, 21);
        base.padding = 0;
        renderer.draw_lines(&mut single, &lines(&["H"]), &base);
        let glyph_top = top_row(&single, 0..8).unwrap();

        let mut fb = MonoFramebuffer::with_dimensions(128, 64);
        let mut padded = config(4, 21);
        padded.padding = 5;
        renderer.draw_lines(&mut fb, &lines(&["H", "H", "H", "H"]), &padded);

        for row in 0..4u32 {
            let start = 5 + 8 * row;
            assert_eq!(top_row(&fb, start..start + 8), Some(start + glyph_top));
        }
        assert!(fb.lit_pixels().all(|(x, y)| x < 5 && (5..37).contains(&y)));
    }

    #[test]
    fn test_builtin_truncation_limits_width() {
        let renderer = TextRenderer::new(Font::Builtin);
        let mut fb = MonoFramebuffer::new();
        renderer.draw_lines(&mut fb, &lines(&["WWWWWWWWWW"]), &config(4, 3));

        assert!(fb.lit_count() > 0);
        assert!(fb.lit_pixels().all(|(x, _)| x < 18));
    }

    #[test]
    fn test_truetype_draws_when_available() {
        let path = Path::new(DEJAVU_SANS_PATH);
        if !path.exists() {
            return;
        }
        let renderer = TextRenderer::new(Font::load(Some(path)).unwrap());
        let mut fb = MonoFramebuffer::new();
        renderer.draw_lines(&mut fb, &lines(&["Test"]), &config(4, 21));
        assert!(fb.lit_count() > 0);
    }
}
