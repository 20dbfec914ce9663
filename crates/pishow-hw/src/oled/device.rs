//! OLED device communication via I2C.

use crate::{Error, Result, OLED_HEIGHT, OLED_WIDTH};
use linux_embedded_hal::I2cdev;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};
use tracing::{debug, info};

use super::framebuffer::MonoFramebuffer;

/// A physical 1-bit display that can show a whole framebuffer at once.
pub trait Panel {
    /// Returns the panel dimensions as (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Pushes the framebuffer to the glass.
    fn show(&mut self, framebuffer: &MonoFramebuffer) -> Result<()>;
}

type Display = Ssd1306<
    I2CInterface<I2cdev>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

/// SSD1306 OLED device controller.
pub struct OledDevice {
    display: Display,
}

fn interface_error<E: std::fmt::Debug>(e: E) -> Error {
    Error::Interface(format!("{:?}", e))
}

impl OledDevice {
    /// Opens the panel on the given I2C bus node and address.
    ///
    /// The controller is initialized and the glass blanked before returning.
    pub fn open(bus_path: &str, address: u8) -> Result<Self> {
        let i2c = I2cdev::new(bus_path).map_err(|e| Error::BusOpen {
            path: bus_path.to_string(),
            reason: e.to_string(),
        })?;
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);

        let mut display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(interface_error)?;
        display.clear_buffer();
        display.flush().map_err(interface_error)?;

        info!(
            "OLED panel opened ({}, address 0x{:02X}, {}x{})",
            bus_path, address, OLED_WIDTH, OLED_HEIGHT
        );

        Ok(Self { display })
    }
}

impl Panel for OledDevice {
    fn dimensions(&self) -> (u32, u32) {
        (OLED_WIDTH, OLED_HEIGHT)
    }

    fn show(&mut self, framebuffer: &MonoFramebuffer) -> Result<()> {
        if framebuffer.width() != OLED_WIDTH || framebuffer.height() != OLED_HEIGHT {
            return Err(Error::FramebufferSize {
                expected_width: OLED_WIDTH,
                expected_height: OLED_HEIGHT,
                width: framebuffer.width(),
                height: framebuffer.height(),
            });
        }

        self.display.clear_buffer();
        for (x, y) in framebuffer.lit_pixels() {
            self.display.set_pixel(x, y, true);
        }
        self.display.flush().map_err(interface_error)?;

        debug!("Panel flushed ({} pixels lit)", framebuffer.lit_count());
        Ok(())
    }
}
