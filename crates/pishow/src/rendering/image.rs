//! Image loading and 1-bit conversion.

use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, GrayImage};
use pishow_hw::MonoFramebuffer;
use std::path::Path;
use tracing::{debug, warn};

use super::RenderError;

/// Converts an image to dithered black and white.
pub fn to_mono(image: &DynamicImage) -> GrayImage {
    let mut luma = image.to_luma8();
    imageops::dither(&mut luma, &BiLevel);
    luma
}

/// Draws an image file into the framebuffer.
///
/// Images that are not already the framebuffer's size are scaled to it with
/// a Lanczos filter and drawn again; that second attempt is final.
pub fn draw_image(fb: &mut MonoFramebuffer, path: &Path) -> Result<(), RenderError> {
    if !path.exists() {
        return Err(RenderError::Missing(path.to_path_buf()));
    }

    let image = image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let mono = to_mono(&image);

    match fb.copy_from_luma(mono.as_raw(), mono.width(), mono.height()) {
        Ok(()) => Ok(()),
        Err(pishow_hw::Error::FramebufferSize { .. }) => {
            warn!(
                "{} is not in {}x{}x1 format, converting.",
                path.display(),
                fb.width(),
                fb.height()
            );
            let resized = image.resize_exact(fb.width(), fb.height(), FilterType::Lanczos3);
            let mono = to_mono(&resized);
            fb.copy_from_luma(mono.as_raw(), mono.width(), mono.height())?;
            debug!("Drew {} after resize", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_exact_size_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.png");
        // Left half white, right half black.
        let img = GrayImage::from_fn(128, 32, |x, _| if x < 64 { Luma([255]) } else { Luma([0]) });
        img.save(&path).unwrap();

        let mut fb = MonoFramebuffer::new();
        draw_image(&mut fb, &path).unwrap();
        assert_eq!(fb.lit_count(), 64 * 32);
        assert_eq!(fb.get_pixel(0, 0), Some(true));
        assert_eq!(fb.get_pixel(127, 31), Some(false));
    }

    #[test]
    fn test_mismatched_image_is_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.png");
        RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let mut fb = MonoFramebuffer::new();
        draw_image(&mut fb, &path).unwrap();
        assert_eq!(fb.lit_count(), 128 * 32);
    }

    #[test]
    fn test_missing_image() {
        let mut fb = MonoFramebuffer::new();
        let err = draw_image(&mut fb, Path::new("/nonexistent/b.png")).unwrap_err();
        assert!(matches!(err, RenderError::Missing(_)));
    }

    #[test]
    fn test_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut fb = MonoFramebuffer::new();
        let err = draw_image(&mut fb, &path).unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_dither_is_bilevel() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([100])));
        let mono = to_mono(&gray);
        assert!(mono.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Mid grey dithers to a mix of both levels.
        assert!(mono.pixels().any(|p| p[0] == 255));
        assert!(mono.pixels().any(|p| p[0] == 0));
    }
}
