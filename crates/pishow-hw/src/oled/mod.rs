//! OLED panel module.
//!
//! Provides control over the 128x32 1-bit SSD1306 panel via I2C.

mod device;

pub mod framebuffer;

pub use device::{OledDevice, Panel};
pub use framebuffer::MonoFramebuffer;
