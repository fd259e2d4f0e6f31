//! # pdf2webp
//!
//! Split a PDF into per-page, high-quality WebP images.
//!
//! ## Why this crate?
//!
//! Batch-rasterizing PDFs for web delivery usually ends with a folder of PNGs
//! several times larger than they need to be, or JPEGs with ringing around
//! every glyph. WebP offers both a lossy mode that keeps rendered text crisp
//! at a fraction of PNG's size and a lossless mode for archival, so this
//! crate renders each page via pdfium and hands the pixels straight to
//! libwebp, one numbered file per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate the path (or pick a PDF from a directory)
//!  ├─ 2. Render  rasterise pages via pdfium at dpi/72 scale (spawn_blocking)
//!  ├─ 3. Encode  RGBA → WebP, lossy (quality + method 6) or lossless
//!  └─ 4. Output  01.webp … NN.webp + per-page results and stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2webp::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", &config).await?;
//!     for file in &output.files {
//!         println!("{}", file.display());
//!     }
//!     eprintln!(
//!         "{}/{} pages converted",
//!         output.stats.converted_pages, output.stats.total_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2webp` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2webp = { version = "0.1", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! A single bad page never aborts the run: its error is recorded in the
//! returned [`PageResult`] and the loop continues. Fatal errors — invalid
//! parameters, an unopenable document, zero pages, or a 100 % page failure
//! rate — come back as [`Pdf2WebpError`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection};
pub use convert::{convert, convert_sync};
pub use error::{PageError, Pdf2WebpError};
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
