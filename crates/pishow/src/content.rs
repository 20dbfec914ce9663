//! Content discovery.
//!
//! A pass over the content path starts with one snapshot listing. Entries are
//! only turned into [`ContentItem`]s right before they are shown, so files
//! removed in between are noticed and skipped.

use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::rendering::RenderError;

/// How a listed file will be shown, decided from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
}

impl ContentKind {
    /// `*.txt` (any case) is text, everything else an image.
    pub fn classify(path: &Path) -> Self {
        let is_text = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(".txt"))
            .unwrap_or(false);
        if is_text {
            ContentKind::Text
        } else {
            ContentKind::Image
        }
    }
}

/// One file from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub path: PathBuf,
    pub kind: ContentKind,
}

/// One displayable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    TextBlock { lines: Vec<String> },
    ImageFile { path: PathBuf },
}

impl ContentEntry {
    pub fn new(path: PathBuf) -> Self {
        let kind = ContentKind::classify(&path);
        Self { path, kind }
    }

    /// Loads the entry for display. `None` if it no longer exists.
    pub fn load(&self) -> Result<Option<ContentItem>, RenderError> {
        if !self.path.exists() {
            return Ok(None);
        }

        match self.kind {
            ContentKind::Image => Ok(Some(ContentItem::ImageFile {
                path: self.path.clone(),
            })),
            ContentKind::Text => match std::fs::read(&self.path) {
                Ok(bytes) => Ok(Some(ContentItem::TextBlock {
                    lines: split_lines(&bytes),
                })),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(source) => Err(RenderError::Read {
                    path: self.path.clone(),
                    source,
                }),
            },
        }
    }
}

/// Splits raw text into lines with trailing whitespace removed.
// Leading whitespace is kept so indented text stays indented.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Lists the content at `path`.
///
/// A file lists as itself. A directory lists its regular files, not
/// recursing, sorted by full path. Anything else lists as nothing.
pub fn list(path: &Path) -> Vec<ContentEntry> {
    if path.is_file() {
        return vec![ContentEntry::new(path.to_path_buf())];
    }
    if !path.is_dir() {
        debug!("{} is neither a file nor a directory", path.display());
        return Vec::new();
    }

    let dir = match std::fs::read_dir(path) {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Unable to list {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    files.into_iter().map(ContentEntry::new).collect()
}

/// Text piped on standard input, read to the end once.
pub struct StdinSource {
    batch: Option<Vec<String>>,
}

impl StdinSource {
    /// Reads the stream to its end right away.
    pub fn read_from(mut reader: impl Read) -> Self {
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            warn!("Error reading stdin: {}", e);
        }
        Self {
            batch: Some(split_lines(&bytes)),
        }
    }

    /// Returns the input read at startup. Empty on every later call.
    pub fn read_batch(&mut self) -> Vec<String> {
        self.batch.take().unwrap_or_default()
    }
}
