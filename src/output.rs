//! Output types: per-page outcomes, run statistics, and the assembled result.
//!
//! The pipeline returns structured per-page outcomes instead of a bare path
//! list: a caller that wants only the files reads
//! [`ConversionOutput::files`]; a caller that needs to report *which* pages
//! failed and why inspects [`ConversionOutput::pages`]. All types serialise
//! with serde so the CLI's `--json` mode is a one-liner.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of converting a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number within the document.
    pub page_num: usize,

    /// Path of the written WebP file. `None` when the page failed.
    pub path: Option<PathBuf>,

    /// Rendered width in pixels (0 when the page failed before rendering).
    pub width: u32,

    /// Rendered height in pixels (0 when the page failed before rendering).
    pub height: u32,

    /// Size of the WebP file on disk.
    pub bytes_written: u64,

    /// The page-level error, if any. `None` means success.
    pub error: Option<PageError>,
}

impl PageResult {
    /// Construct the record for a page that failed before producing a file.
    pub(crate) fn failed(page_num: usize, error: PageError) -> Self {
        Self {
            page_num,
            path: None,
            width: 0,
            height: 0,
            bytes_written: 0,
            error: Some(error),
        }
    }

    /// True when the page produced an output file.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,

    /// Pages selected for conversion (equals `total_pages` unless a page
    /// selection narrowed the run).
    pub selected_pages: usize,

    /// Pages that produced an output file.
    pub converted_pages: usize,

    /// Pages that failed and were skipped.
    pub failed_pages: usize,

    /// Total bytes written across all output files.
    pub total_bytes: u64,

    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration_ms: u64,
}

/// The result of a conversion run.
///
/// Returned by [`crate::convert::convert`] whenever at least one page
/// succeeded; a run where every page fails is a fatal
/// [`crate::error::Pdf2WebpError::AllPagesFailed`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The directory the numbered page files were written into.
    pub output_dir: PathBuf,

    /// Paths of the successfully written files, in ascending page order.
    ///
    /// A failed page is absent from this list, never replaced by a
    /// placeholder, so `files.len() == stats.converted_pages`.
    pub files: Vec<PathBuf>,

    /// Per-page outcomes for every attempted page, in ascending page order.
    pub pages: Vec<PageResult>,

    /// Aggregate run statistics.
    pub stats: ConversionStats,
}
