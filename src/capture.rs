//! Sample classification and capture-file storage.
//!
//! The reader reports an empty field with one of a few fixed English
//! sentences. Anything else is treated as a tag and written to disk as-is.

use anyhow::{Context, Result};
use log::debug;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Reader output lines meaning no tag was in the field.
pub const NO_TAG_MARKERS: [&str; 2] = [
    "No known 125/134 kHz tags found!",
    "No known/supported 13.56 MHz tags found",
];

/// Extension of capture files.
pub const CAPTURE_EXTENSION: &str = "lf";

/// Result of inspecting one sample's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A no-tag marker was present.
    NoTag,
    /// Anything else; worth keeping.
    Tag,
}

/// Decides whether reader output contains a tag.
///
/// # Example
///
/// ```
/// use emcatcher::capture::{SampleOutcome, classify};
///
/// assert_eq!(classify("[-] No known 125/134 kHz tags found!"), SampleOutcome::NoTag);
/// assert_eq!(classify("[+] EM 410x ID 0F0368568B"), SampleOutcome::Tag);
/// ```
pub fn classify(output: &str) -> SampleOutcome {
    if NO_TAG_MARKERS.iter().any(|marker| output.contains(marker)) {
        SampleOutcome::NoTag
    } else {
        SampleOutcome::Tag
    }
}

/// File name of the capture taken at `timestamp` (unix seconds).
pub fn capture_file_name(timestamp: i64) -> String {
    format!("{timestamp}.{CAPTURE_EXTENSION}")
}

/// Directory of capture files, one per collected sample.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the capture directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create capture directory {}", self.dir.display())
        })
    }

    /// Writes `output` to `<dir>/<timestamp>.lf`.
    ///
    /// The file must not exist yet; an earlier capture is never replaced.
    pub fn persist(&self, output: &str, timestamp: i64) -> Result<PathBuf> {
        let path = self.dir.join(capture_file_name(timestamp));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to create capture file {}", path.display()))?;

        file.write_all(output.as_bytes())
            .and_then(|()| file.flush())
            .with_context(|| format!("Failed to write capture file {}", path.display()))?;

        debug!("Wrote {} bytes to {}", output.len(), path.display());
        Ok(path)
    }
}
