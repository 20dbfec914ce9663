//! Drawing surfaces.
//!
//! [`PanelCanvas`] keeps a 1-bit framebuffer and pushes it to an OLED panel.
//! [`WindowedCanvas`] has no buffer at all: each item launches a helper
//! program (xmessage or feh) that is terminated again once the item's dwell
//! time is over.

use pishow_hw::{MonoFramebuffer, Panel};
use std::path::Path;
use std::process::{Child, Command};
use tracing::debug;

use super::image::draw_image;
use super::text::{select_lines, TextRenderer};
use super::RenderError;
use crate::config::RenderConfig;
use crate::detect::Helpers;

/// A surface one content item at a time is drawn onto.
pub trait Canvas {
    /// Blanks the surface.
    fn clear(&mut self);

    /// Draws a block of text lines.
    fn draw_text_lines(&mut self, lines: &[String], config: &RenderConfig)
        -> Result<(), RenderError>;

    /// Draws an image file.
    fn draw_image(&mut self, path: &Path) -> Result<(), RenderError>;

    /// Makes the drawing visible on the physical output.
    fn flush(&mut self) -> Result<(), RenderError>;

    /// Releases whatever the last item holds once its dwell time is over.
    fn release(&mut self);
}

/// Canvas backed by a framebuffer and a physical panel.
pub struct PanelCanvas<P: Panel> {
    panel: P,
    framebuffer: MonoFramebuffer,
    text_renderer: TextRenderer,
}

impl<P: Panel> PanelCanvas<P> {
    /// Creates a canvas sized to the panel.
    pub fn new(panel: P, text_renderer: TextRenderer) -> Self {
        let (width, height) = panel.dimensions();
        Self {
            panel,
            framebuffer: MonoFramebuffer::with_dimensions(width, height),
            text_renderer,
        }
    }

    /// Returns the canvas dimensions.
    #[cfg(test)]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.framebuffer.width(), self.framebuffer.height())
    }

    /// Returns the framebuffer as last drawn.
    #[cfg(test)]
    pub fn framebuffer(&self) -> &MonoFramebuffer {
        &self.framebuffer
    }

    #[cfg(test)]
    pub fn panel(&self) -> &P {
        &self.panel
    }
}

impl<P: Panel> Canvas for PanelCanvas<P> {
    fn clear(&mut self) {
        self.framebuffer.clear(false);
    }

    fn draw_text_lines(
        &mut self,
        lines: &[String],
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        self.text_renderer
            .draw_lines(&mut self.framebuffer, lines, config);
        Ok(())
    }

    fn draw_image(&mut self, path: &Path) -> Result<(), RenderError> {
        draw_image(&mut self.framebuffer, path)
    }

    fn flush(&mut self) -> Result<(), RenderError> {
        self.panel.show(&self.framebuffer)?;
        Ok(())
    }

    fn release(&mut self) {}
}

/// Canvas that hands each item to a desktop helper program.
pub struct WindowedCanvas {
    helpers: Helpers,
    helper: Option<Child>,
}

impl WindowedCanvas {
    pub fn new(helpers: Helpers) -> Self {
        Self {
            helpers,
            helper: None,
        }
    }

    /// Process id of the running helper, if any.
    #[cfg(test)]
    pub fn helper_pid(&self) -> Option<u32> {
        self.helper.as_ref().map(Child::id)
    }

    fn launch(&mut self, program: &Path, arg: &std::ffi::OsStr) -> Result<(), RenderError> {
        self.release();
        let child = Command::new(program)
            .arg(arg)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;
        debug!("Started {} (pid {})", program.display(), child.id());
        self.helper = Some(child);
        Ok(())
    }
}

impl Canvas for WindowedCanvas {
    fn clear(&mut self) {}

    fn draw_text_lines(
        &mut self,
        lines: &[String],
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        let program = self
            .helpers
            .text
            .clone()
            .ok_or(RenderError::HelperMissing("xmessage"))?;
        let message = select_lines(lines, config).join("\n");
        self.launch(&program, message.as_ref())
    }

    fn draw_image(&mut self, path: &Path) -> Result<(), RenderError> {
        if !path.exists() {
            return Err(RenderError::Missing(path.to_path_buf()));
        }
        let program = self
            .helpers
            .image
            .clone()
            .ok_or(RenderError::HelperMissing("feh"))?;
        self.launch(&program, path.as_os_str())
    }

    fn flush(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn release(&mut self) {
        let Some(mut child) = self.helper.take() else {
            return;
        };

        // SAFETY: kill(2) has no memory effects; the pid is our unreaped child.
        let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
        if rc != 0 {
            debug!("Helper {} already gone", child.id());
        }
        match child.wait() {
            Ok(status) => debug!("Helper {} exited: {}", child.id(), status),
            Err(e) => debug!("Failed to reap helper {}: {}", child.id(), e),
        }
    }
}

impl Drop for WindowedCanvas {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rendering::Font;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    /// Panel that keeps every frame it is shown.
    #[derive(Default)]
    pub(crate) struct FakePanel {
        pub frames: Vec<MonoFramebuffer>,
    }

    impl Panel for FakePanel {
        fn dimensions(&self) -> (u32, u32) {
            (128, 32)
        }

        fn show(&mut self, framebuffer: &MonoFramebuffer) -> pishow_hw::Result<()> {
            self.frames.push(framebuffer.clone());
            Ok(())
        }
    }

    fn render_config() -> RenderConfig {
        RenderConfig {
            max_lines: 4,
            max_chars: 21,
            padding: -2,
            dwell: Duration::ZERO,
        }
    }

    fn panel_canvas() -> PanelCanvas<FakePanel> {
        PanelCanvas::new(FakePanel::default(), TextRenderer::new(Font::Builtin))
    }

    #[test]
    fn test_canvas_creation() {
        let canvas = panel_canvas();
        assert_eq!(canvas.dimensions(), (128, 32));
    }

    #[test]
    fn test_clear_prevents_bleed_through() {
        let mut canvas = panel_canvas();
        canvas
            .draw_text_lines(&["first".to_string()], &render_config())
            .unwrap();
        assert!(canvas.framebuffer().lit_count() > 0);

        canvas.clear();
        assert_eq!(canvas.framebuffer().lit_count(), 0);
    }

    #[test]
    fn test_flush_shows_frame() {
        let mut canvas = panel_canvas();
        canvas.clear();
        canvas
            .draw_text_lines(&["hello".to_string()], &render_config())
            .unwrap();
        canvas.flush().unwrap();

        assert_eq!(canvas.panel().frames.len(), 1);
        assert_eq!(&canvas.panel().frames[0], canvas.framebuffer());
    }

    #[test]
    fn test_small_image_resized_to_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.png");
        RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let mut canvas = panel_canvas();
        canvas.draw_image(&path).unwrap();
        canvas.flush().unwrap();
        assert_eq!(canvas.panel().frames[0].lit_count(), 128 * 32);
    }

    #[test]
    fn test_windowed_missing_helpers() {
        let mut canvas = WindowedCanvas::new(Helpers::default());
        let err = canvas
            .draw_text_lines(&["hi".to_string()], &render_config())
            .unwrap_err();
        assert!(matches!(err, RenderError::HelperMissing("xmessage")));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.png");
        std::fs::write(&path, b"png").unwrap();
        let err = canvas.draw_image(&path).unwrap_err();
        assert!(matches!(err, RenderError::HelperMissing("feh")));
    }

    #[test]
    fn test_windowed_missing_image() {
        let helpers = Helpers {
            text: None,
            image: Some(PathBuf::from("/usr/bin/feh")),
        };
        let mut canvas = WindowedCanvas::new(helpers);
        let err = canvas.draw_image(Path::new("/nonexistent/b.png")).unwrap_err();
        assert!(matches!(err, RenderError::Missing(_)));
        assert_eq!(canvas.helper_pid(), None);
    }

    #[test]
    fn test_windowed_release_terminates_helper() {
        let sleep = Path::new("/bin/sleep");
        if !sleep.exists() {
            return;
        }
        let helpers = Helpers {
            text: Some(sleep.to_path_buf()),
            image: None,
        };
        let mut canvas = WindowedCanvas::new(helpers);

        // The helper receives the joined lines as its argument: `sleep 30`.
        canvas
            .draw_text_lines(&["30".to_string()], &render_config())
            .unwrap();
        let pid = canvas.helper_pid().unwrap();

        let started = Instant::now();
        canvas.release();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(canvas.helper_pid(), None);

        // The child has been reaped, so the pid no longer names a process.
        let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
        assert_eq!(rc, -1);
    }

    #[test]
    fn test_windowed_spawn_failure() {
        let helpers = Helpers {
            text: Some(PathBuf::from("/nonexistent/xmessage")),
            image: None,
        };
        let mut canvas = WindowedCanvas::new(helpers);
        let err = canvas
            .draw_text_lines(&["hi".to_string()], &render_config())
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }
}
