//! Rendering module for canvases, text and images.

mod canvas;
mod image;
mod text;

use std::path::PathBuf;
use thiserror::Error;

pub use canvas::{Canvas, PanelCanvas, WindowedCanvas};
pub use text::{select_lines, Font, TextRenderer};

#[cfg(test)]
pub(crate) use canvas::tests as canvas_tests;

/// Failure to show one content item. Never fatal to the loop.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{} unreadable, skipping.", .0.display())]
    Missing(PathBuf),

    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to open image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },

    #[error(transparent)]
    Hardware(#[from] pishow_hw::Error),

    #[error("{0} is not installed")]
    HelperMissing(&'static str),

    #[error("Unable to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
