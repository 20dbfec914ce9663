//! Configuration management.
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! and command-line flags, later layers winning. The result is one immutable
//! [`RunConfig`] handed to the rest of the program.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::DisplayTarget;

/// Height in pixels of one text row.
pub const LINE_HEIGHT: u32 = 8;

/// Width in pixels of one character cell.
pub const CHAR_WIDTH: u32 = 6;

/// Vertical offset of the first text row.
pub const TEXT_PADDING: i32 = -2;

/// Command-line flags.
#[derive(Parser, Debug, Default)]
#[command(name = "pi-show")]
#[command(about = "Show text or graphics on a display connected to a Raspberry Pi")]
#[command(version)]
pub struct Cli {
    /// Seconds to show a screen before moving to the next (default: 8)
    #[arg(short, long)]
    pub wait: Option<u64>,

    /// File or directory that holds text files/images to be shown (default: /var/toshow/)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Show each requested object once, then exit (default: continuous loop)
    #[arg(short, long)]
    pub once: bool,

    /// Show text handed on stdin (lines are only read a single time)
    #[arg(short, long)]
    pub stdin: bool,

    /// Full path to a TrueType font file (default: DejaVuSans, then built-in)
    #[arg(short, long)]
    pub font: Option<PathBuf>,

    /// Show additional debugging information on stderr
    #[arg(long)]
    pub debug: bool,

    /// Optional TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Settings file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dwell seconds per item
    #[serde(default)]
    pub wait: Option<u64>,

    /// Content file or directory
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// TrueType font file
    #[serde(default)]
    pub font: Option<PathBuf>,

    /// Panel bus configuration
    #[serde(default)]
    pub panel: PanelConfig,

    /// Windowed fallback helper programs
    #[serde(default)]
    pub helpers: HelperConfig,
}

/// I2C panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// I2C bus number
    #[serde(default = "default_bus")]
    pub bus: u8,

    /// Panel I2C address
    #[serde(default = "default_address")]
    pub address: u8,

    /// Path of the i2cdetect bus scanner
    #[serde(default = "default_scanner")]
    pub scanner: PathBuf,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
            scanner: default_scanner(),
        }
    }
}

impl PanelConfig {
    /// Device node of the configured bus.
    pub fn bus_node(&self) -> PathBuf {
        PathBuf::from(pishow_hw::probe::bus_node(self.bus))
    }
}

/// Candidate locations of the windowed helper programs, tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Text popup helper (xmessage)
    #[serde(default = "default_text_helpers")]
    pub text: Vec<PathBuf>,

    /// Image viewer helper (feh)
    #[serde(default = "default_image_helpers")]
    pub image: Vec<PathBuf>,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            text: default_text_helpers(),
            image: default_image_helpers(),
        }
    }
}

// Default value functions
fn default_wait() -> u64 {
    8
}

fn default_directory() -> PathBuf {
    PathBuf::from("/var/toshow/")
}

fn default_bus() -> u8 {
    pishow_hw::I2C_BUS
}

fn default_address() -> u8 {
    pishow_hw::OLED_ADDRESS
}

fn default_scanner() -> PathBuf {
    PathBuf::from(pishow_hw::probe::I2CDETECT_PATH)
}

fn default_text_helpers() -> Vec<PathBuf> {
    ["/opt/X11/bin/xmessage", "/bin/xmessage", "/usr/bin/xmessage"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn default_image_helpers() -> Vec<PathBuf> {
    ["/usr/bin/feh", "/bin/feh", "/opt/local/bin/feh"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }
}

/// Immutable settings for one run of the program.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub wait: Duration,
    pub directory: PathBuf,
    pub once: bool,
    pub stdin: bool,
    pub font: Option<PathBuf>,
    pub debug: bool,
    pub panel: PanelConfig,
    pub helpers: HelperConfig,
}

impl RunConfig {
    /// Layers command-line flags over the settings file.
    pub fn resolve(cli: Cli, file: Config) -> Self {
        Self {
            wait: Duration::from_secs(cli.wait.or(file.wait).unwrap_or_else(default_wait)),
            directory: cli
                .directory
                .or(file.directory)
                .unwrap_or_else(default_directory),
            once: cli.once,
            stdin: cli.stdin,
            font: cli.font.or(file.font),
            debug: cli.debug,
            panel: file.panel,
            helpers: file.helpers,
        }
    }
}

/// Per-run text layout settings, derived once from the display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum number of text lines shown
    pub max_lines: usize,
    /// Maximum characters shown per line
    pub max_chars: usize,
    /// Vertical offset of the first line in pixels
    pub padding: i32,
    /// How long each item stays on screen
    pub dwell: Duration,
}

impl RenderConfig {
    pub fn for_target(target: &DisplayTarget, dwell: Duration) -> Self {
        let (width, height) = target.dimensions();
        Self {
            max_lines: (height / LINE_HEIGHT) as usize,
            max_chars: (width / CHAR_WIDTH) as usize,
            padding: TEXT_PADDING,
            dwell,
        }
    }
}
