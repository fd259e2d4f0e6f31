//! PDF rasterisation: render pages to `DynamicImage` via pdfium.
//!
//! ## Why a scale factor instead of a target width?
//!
//! PDF user space is 72 points per inch, so rendering at a requested DPI is a
//! uniform scale of `dpi / 72.0` on both axes. Scaling by factor keeps the
//! pixel density constant across mixed page sizes within one document; a
//! fixed target width would silently render an A3 foldout at a lower DPI than
//! its A4 siblings.
//!
//! ## Handle lifetime
//!
//! The `PdfDocument` returned by [`open_document`] borrows the `Pdfium`
//! binding, and dropping it closes the document. The caller keeps both inside
//! one blocking scope, so the document is released on every exit path,
//! including mid-loop fatal errors.

use crate::error::{PageError, Pdf2WebpError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// PDF user space resolution, in points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// The uniform scale factor mapping 72-DPI page space to the requested DPI.
pub(crate) fn zoom_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

/// Build the render configuration shared by every page of a run.
///
/// DPI is a per-run setting, so this is computed once and reused.
pub(crate) fn render_config_for_dpi(dpi: u32) -> PdfRenderConfig {
    PdfRenderConfig::new().scale_page_by_factor(zoom_for_dpi(dpi))
}

/// Open a PDF document, mapping pdfium load errors to the fatal taxonomy.
pub(crate) fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2WebpError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2WebpError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2WebpError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2WebpError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Rasterise one page to an in-memory image at the shared scale.
///
/// Failures here are page-scoped: the caller logs them and moves on to the
/// next page.
pub(crate) fn render_page(
    pages: &PdfPages<'_>,
    index: usize,
    render_config: &PdfRenderConfig,
) -> Result<DynamicImage, PageError> {
    let page_num = index + 1;

    let page = pages.get(index as u16).map_err(|e| PageError::RenderFailed {
        page: page_num,
        detail: format!("{:?}", e),
    })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_identity_at_native_resolution() {
        assert_eq!(zoom_for_dpi(72), 1.0);
    }

    #[test]
    fn zoom_scales_linearly() {
        assert_eq!(zoom_for_dpi(144), 2.0);
        assert!((zoom_for_dpi(300) - 300.0 / 72.0).abs() < f32::EPSILON);
    }
}
