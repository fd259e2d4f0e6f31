//! Configuration types for PDF-to-WebP conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest. Range checks live in
//! [`ConversionConfigBuilder::build`] and in [`ConversionConfig::validate`],
//! which the pipeline re-runs before touching the filesystem, so an
//! out-of-range DPI can never create an output directory.

use crate::error::Pdf2WebpError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default rendering resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Default lossy WebP quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Inclusive DPI bounds accepted by the pipeline.
pub const DPI_RANGE: (u32, u32) = (72, 1200);

/// Configuration for a PDF-to-WebP conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2webp::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(600)
///     .quality(95)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–1200. Default: 300.
    ///
    /// 300 DPI reproduces print-quality detail and is the right default for
    /// archival. Drop to 150 for screen-only delivery where file size matters
    /// more than pixel density; raise towards 600 for small-print documents
    /// that will be zoomed.
    pub dpi: u32,

    /// Lossy WebP quality. Range: 0–100. Default: 90. Ignored when
    /// [`lossless`](Self::lossless) is set.
    ///
    /// 90 keeps rendered text visually indistinguishable from the source
    /// while producing files several times smaller than PNG. Values below 75
    /// start to show ringing around glyph edges.
    pub quality: u8,

    /// Use lossless WebP encoding. Default: false.
    ///
    /// Lossless output reproduces the rendered pixels exactly, at roughly
    /// 2–4× the file size of quality-90 lossy. The quality setting has no
    /// effect in this mode.
    pub lossless: bool,

    /// Destination directory for the numbered page files.
    ///
    /// If `None`, a `<stem>_webp` directory is created beside the source PDF
    /// (`report.pdf` → `report_webp/`).
    pub output_dir: Option<PathBuf>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional per-page progress callback. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            quality: DEFAULT_QUALITY,
            lossless: false,
            output_dir: None,
            pages: PageSelection::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("quality", &self.quality)
            .field("lossless", &self.lossless)
            .field("output_dir", &self.output_dir)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check that DPI and quality are within their accepted ranges.
    ///
    /// Called by [`ConversionConfigBuilder::build`] and again at the top of
    /// [`crate::convert::convert`]; the struct's fields are public, so a
    /// hand-assembled config gets the same treatment as a built one.
    pub fn validate(&self) -> Result<(), Pdf2WebpError> {
        let (min_dpi, max_dpi) = DPI_RANGE;
        if self.dpi < min_dpi || self.dpi > max_dpi {
            return Err(Pdf2WebpError::InvalidConfig(format!(
                "DPI must be within {min_dpi}–{max_dpi}, got {}",
                self.dpi
            )));
        }
        if self.quality > 100 {
            return Err(Pdf2WebpError::InvalidConfig(format!(
                "Quality must be within 0–100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn lossless(mut self, v: bool) -> Self {
        self.config.lossless = v;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2WebpError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to convert.
///
/// Output filenames always carry the true document page number, so converting
/// only pages 3–5 still produces `03.webp`, `04.webp`, `05.webp`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
