//! Error types for the pi-show hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// I2C bus device could not be opened.
    #[error("I2C bus {path} could not be opened: {reason}")]
    BusOpen { path: String, reason: String },

    /// The display controller rejected a command or transfer.
    #[error("Display interface error: {0}")]
    Interface(String),

    /// Bus scanner could not be run.
    #[error("Bus scan failed: {0}")]
    Scan(#[from] std::io::Error),

    /// Framebuffer size mismatch.
    #[error("Framebuffer size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    FramebufferSize {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
}
