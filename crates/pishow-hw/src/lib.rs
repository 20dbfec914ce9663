//! pi-show Hardware Library
//!
//! Provides hardware abstraction for the small 1-bit OLED panels (SSD1306,
//! PiOLED and compatibles) that hang off a single-board computer's I2C bus.

pub mod error;
pub mod oled;
pub mod probe;

pub use error::{Error, Result};
pub use oled::{MonoFramebuffer, OledDevice, Panel};

/// OLED panel dimensions
pub const OLED_WIDTH: u32 = 128;
pub const OLED_HEIGHT: u32 = 32;

/// 7-bit I2C address the SSD1306 answers on
pub const OLED_ADDRESS: u8 = 0x3C;

/// I2C bus the panel header is wired to on a Raspberry Pi
pub const I2C_BUS: u8 = 1;
