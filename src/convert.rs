//! Conversion entry points and the per-page pipeline loop.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! The entire document lifetime — open, page loop, close — lives inside one
//! `tokio::task::spawn_blocking` call, which also gives the document handle a
//! single owning scope: whether the loop finishes, a fatal error propagates,
//! or a page fails midway, dropping the closure's locals closes the document
//! exactly once.
//!
//! ## Per-page error boundary
//!
//! Render, encode, and write failures are caught per page and recorded in the
//! page's [`PageResult`]; the loop continues. Only "the whole run is
//! pointless" conditions (open failure, zero pages, zero successes) surface
//! as [`Pdf2WebpError`].

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2WebpError};
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::{encode, input, render};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF file to per-page WebP images.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `pdf_path` — path to the source PDF
/// * `config`   — conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` when at least one page converted, even if some
/// pages failed (check `output.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(Pdf2WebpError)` only for fatal errors:
/// - Out-of-range DPI or quality (checked before any filesystem work)
/// - Source file missing, unreadable, or not a PDF
/// - Document failed to open, has no pages, or matched no selected pages
/// - Every selected page failed
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2WebpError> {
    let total_start = Instant::now();

    // Parameters first: an out-of-range DPI must never create a directory.
    config.validate()?;

    let pdf_path = input::resolve_source(pdf_path.as_ref())?;
    info!("Starting conversion: {}", pdf_path.display());

    let output_dir = resolve_output_dir(&pdf_path, config.output_dir.as_deref());
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| Pdf2WebpError::OutputDirFailed {
            path: output_dir.clone(),
            source: e,
        })?;
    info!("Output directory: {}", output_dir.display());

    let (total_pages, pages) = {
        let pdf_path = pdf_path.clone();
        let output_dir = output_dir.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            convert_document_blocking(&pdf_path, &output_dir, &config)
        })
        .await
        .map_err(|e| Pdf2WebpError::Internal(format!("Conversion task panicked: {}", e)))??
    };

    let converted = pages.iter().filter(|p| p.is_success()).count();
    let failed = pages.len() - converted;

    if converted == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());

        return Err(Pdf2WebpError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(pages.len(), converted);
    }

    let files: Vec<PathBuf> = pages.iter().filter_map(|p| p.path.clone()).collect();

    let stats = ConversionStats {
        total_pages,
        selected_pages: pages.len(),
        converted_pages: converted,
        failed_pages: failed,
        total_bytes: pages.iter().map(|p| p.bytes_written).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        converted, stats.selected_pages, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_dir,
        files,
        pages,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2WebpError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2WebpError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Blocking implementation: owns the pdfium document for its whole lifetime.
///
/// Returns the document's total page count and one [`PageResult`] per
/// selected page, in ascending page order.
fn convert_document_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<(usize, Vec<PageResult>), Pdf2WebpError> {
    let pdfium = Pdfium::default();
    let document = render::open_document(&pdfium, pdf_path, config.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if total_pages == 0 {
        return Err(Pdf2WebpError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }

    let indices = config.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(Pdf2WebpError::EmptySelection { total: total_pages });
    }
    let selected = indices.len();
    debug!("Selected {} pages for conversion", selected);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    // One render config for the whole run: DPI is a per-run setting.
    let render_config = render::render_config_for_dpi(config.dpi);

    let mut results = Vec::with_capacity(selected);
    for index in indices {
        let page_num = index + 1;
        info!("Processing page {}/{}", page_num, total_pages);

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        match convert_page(&pages, index, &render_config, output_dir, config) {
            Ok(result) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, selected, result.bytes_written);
                }
                results.push(result);
            }
            Err(e) => {
                // One bad page never aborts the run.
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                results.push(PageResult::failed(page_num, e));
            }
        }
    }

    Ok((total_pages, results))
}

/// Render, encode, and write a single page.
fn convert_page(
    pages: &PdfPages<'_>,
    index: usize,
    render_config: &PdfRenderConfig,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<PageResult, PageError> {
    let page_num = index + 1;

    let image = render::render_page(pages, index, render_config)?;

    let bytes =
        encode::encode_page(&image, config.quality, config.lossless).map_err(|e| {
            PageError::EncodeFailed {
                page: page_num,
                detail: e.to_string(),
            }
        })?;

    let path = output_dir.join(page_filename(page_num));
    std::fs::write(&path, &bytes).map_err(|e| PageError::WriteFailed {
        page: page_num,
        detail: e.to_string(),
    })?;
    debug!("Saved: {}", path.display());

    Ok(PageResult {
        page_num,
        path: Some(path),
        width: image.width(),
        height: image.height(),
        bytes_written: bytes.len() as u64,
        error: None,
    })
}

/// Output filename for a 1-based page number: zero-padded to at least two
/// digits, widening naturally past page 99.
fn page_filename(page_num: usize) -> String {
    format!("{page_num:02}.webp")
}

/// Resolve the destination directory: the explicit one if given, otherwise
/// `<stem>_webp` beside the source file.
fn resolve_output_dir(pdf_path: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => {
            let stem = pdf_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            pdf_path.with_file_name(format!("{stem}_webp"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn page_filenames_are_zero_padded() {
        assert_eq!(page_filename(1), "01.webp");
        assert_eq!(page_filename(9), "09.webp");
        assert_eq!(page_filename(10), "10.webp");
        assert_eq!(page_filename(99), "99.webp");
        assert_eq!(page_filename(123), "123.webp");
    }

    #[test]
    fn default_output_dir_is_stem_sibling() {
        assert_eq!(
            resolve_output_dir(Path::new("/data/docs/report.pdf"), None),
            PathBuf::from("/data/docs/report_webp")
        );
        assert_eq!(
            resolve_output_dir(Path::new("report.pdf"), None),
            PathBuf::from("report_webp")
        );
    }

    #[test]
    fn explicit_output_dir_wins() {
        assert_eq!(
            resolve_output_dir(Path::new("/data/report.pdf"), Some(Path::new("/tmp/out"))),
            PathBuf::from("/tmp/out")
        );
    }

    #[test]
    fn invalid_dpi_rejected_before_any_filesystem_work() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let out = dir.path().join("out");

        let config = ConversionConfig {
            dpi: 50,
            output_dir: Some(out.clone()),
            ..ConversionConfig::default()
        };

        let err = convert_sync(&pdf, &config).unwrap_err();
        assert!(matches!(err, Pdf2WebpError::InvalidConfig(_)));
        assert!(!out.exists(), "output dir must not be created");
    }

    #[test]
    fn invalid_quality_rejected_before_any_filesystem_work() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let out = dir.path().join("out");

        let config = ConversionConfig {
            quality: 150,
            output_dir: Some(out.clone()),
            ..ConversionConfig::default()
        };

        let err = convert_sync(&pdf, &config).unwrap_err();
        assert!(matches!(err, Pdf2WebpError::InvalidConfig(_)));
        assert!(!out.exists(), "output dir must not be created");
    }

    #[test]
    fn missing_source_is_fatal_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let config = ConversionConfig {
            output_dir: Some(out.clone()),
            ..ConversionConfig::default()
        };

        let err = convert_sync(dir.path().join("nope.pdf"), &config).unwrap_err();
        assert!(matches!(err, Pdf2WebpError::FileNotFound { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn non_pdf_source_is_fatal_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let junk = dir.path().join("junk.pdf");
        fs::write(&junk, b"GIF89a not a pdf at all").unwrap();
        let out = dir.path().join("out");
        let config = ConversionConfig {
            output_dir: Some(out.clone()),
            ..ConversionConfig::default()
        };

        let err = convert_sync(&junk, &config).unwrap_err();
        assert!(matches!(err, Pdf2WebpError::NotAPdf { .. }));
        assert!(!out.exists());
    }
}
