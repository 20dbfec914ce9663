//! I2C bus probing via the `i2cdetect` tool from i2c-tools.
//!
//! `i2cdetect -y <bus> <first> <last>` prints a grid with one row per 16
//! addresses; a responding device shows its own address in its cell.

use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::Result;

/// Default location of the scanner on Raspberry Pi OS.
pub const I2CDETECT_PATH: &str = "/usr/sbin/i2cdetect";

/// Device node for an I2C bus number.
pub fn bus_node(bus: u8) -> String {
    format!("/dev/i2c-{}", bus)
}

/// Runs the scanner over a single address and reports whether it answered.
pub fn scan(scanner: &Path, bus: u8, address: u8) -> Result<bool> {
    let addr = format!("0x{:02x}", address);
    let output = Command::new(scanner)
        .arg("-y")
        .arg(bus.to_string())
        .arg(&addr)
        .arg(&addr)
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("{} -y {} {} {}:\n{}", scanner.display(), bus, addr, addr, stdout);

    Ok(address_present(&stdout, address))
}

/// Looks for `address` in its row of an `i2cdetect` grid.
pub fn address_present(grid: &str, address: u8) -> bool {
    let row_label = format!("{:02x}:", address & 0xF0);
    let cell = format!("{:02x}", address);

    grid.lines()
        .filter_map(|line| line.trim_start().strip_prefix(&row_label))
        .any(|cells| cells.split_whitespace().any(|c| c.eq_ignore_ascii_case(&cell)))
}
