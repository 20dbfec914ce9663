//! Display detection.
//!
//! Runs once at startup and picks the single render target for the process:
//! the I2C OLED panel when it answers on the bus, otherwise an X display with
//! at least one helper program installed.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{HelperConfig, PanelConfig};

/// Fixed size of the windowed fallback.
pub const WINDOW_WIDTH: u32 = 1024;
pub const WINDOW_HEIGHT: u32 = 768;

/// The display the process renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTarget {
    /// 1-bit OLED panel on the I2C bus.
    PixelPanel { width: u32, height: u32 },
    /// Desktop session driven through helper programs.
    WindowedFallback { width: u32, height: u32 },
}

impl DisplayTarget {
    /// Returns the display dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            DisplayTarget::PixelPanel { width, height }
            | DisplayTarget::WindowedFallback { width, height } => (width, height),
        }
    }
}

impl std::fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayTarget::PixelPanel { width, height } => {
                write!(f, "ssd1306 panel ({}x{})", width, height)
            }
            DisplayTarget::WindowedFallback { width, height } => {
                write!(f, "X windows ({}x{})", width, height)
            }
        }
    }
}

/// Detection failures. All of them are fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DetectionError {
    #[error(
        "No display found. If you are using an I2C display, run raspi-config, enable I2C \
         under Interfacing options, install i2c-tools and reboot. Otherwise run under X \
         with xmessage or feh installed."
    )]
    NoDisplayFound,
}

/// Facts about the host that detection depends on.
pub trait Host {
    /// Whether a filesystem path exists.
    fn path_exists(&self, path: &Path) -> bool;

    /// Value of an environment variable.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Whether a device answers at `address` on the bus.
    fn scan_bus(&self, scanner: &Path, bus: u8, address: u8) -> bool;
}

/// The real machine.
pub struct SystemHost;

impl Host for SystemHost {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn scan_bus(&self, scanner: &Path, bus: u8, address: u8) -> bool {
        match pishow_hw::probe::scan(scanner, bus, address) {
            Ok(found) => found,
            Err(e) => {
                warn!("Bus scan failed: {}", e);
                false
            }
        }
    }
}

/// Installed helper programs for the windowed fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Helpers {
    pub text: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

impl Helpers {
    /// Picks the first existing candidate of each helper.
    pub fn locate(host: &dyn Host, config: &HelperConfig) -> Self {
        let first = |candidates: &[PathBuf]| {
            candidates
                .iter()
                .find(|p| host.path_exists(p))
                .cloned()
        };
        Self {
            text: first(&config.text),
            image: first(&config.image),
        }
    }

    pub fn any(&self) -> bool {
        self.text.is_some() || self.image.is_some()
    }
}

/// Probes the host for a display.
pub fn detect(
    host: &dyn Host,
    panel: &PanelConfig,
    helpers: &Helpers,
) -> Result<DisplayTarget, DetectionError> {
    let bus_node = panel.bus_node();
    if host.path_exists(&bus_node) && host.path_exists(&panel.scanner) {
        if host.scan_bus(&panel.scanner, panel.bus, panel.address) {
            let target = DisplayTarget::PixelPanel {
                width: pishow_hw::OLED_WIDTH,
                height: pishow_hw::OLED_HEIGHT,
            };
            info!("Detected {} at 0x{:02X}", target, panel.address);
            return Ok(target);
        }
        debug!(
            "Nothing at 0x{:02X} on {}",
            panel.address,
            bus_node.display()
        );
    } else {
        debug!(
            "{} or {} missing, skipping bus scan",
            bus_node.display(),
            panel.scanner.display()
        );
    }

    if host.env_var("DISPLAY").is_some() && helpers.any() {
        let target = DisplayTarget::WindowedFallback {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
        };
        info!("Detected {}", target);
        return Ok(target);
    }

    Err(DetectionError::NoDisplayFound)
}
