//! Input resolution: validate a source path and locate PDFs in a directory.
//!
//! ## Why check magic bytes?
//!
//! pdfium's load error for a non-PDF file is an opaque "format error". Reading
//! the first four bytes up front costs one `open` and gives callers a precise
//! [`Pdf2WebpError::NotAPdf`] naming the offending bytes instead of a pdfium
//! crash report. The same open doubles as the read-permission probe.

use crate::error::Pdf2WebpError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a user-supplied source path.
///
/// The path must exist, be a regular file, be readable, and start with the
/// `%PDF` magic bytes. Returns the path unchanged on success.
pub fn resolve_source(path: &Path) -> Result<PathBuf, Pdf2WebpError> {
    if !path.exists() {
        return Err(Pdf2WebpError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(Pdf2WebpError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2WebpError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2WebpError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2WebpError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// Find all PDF files in `dir`, sorted by file name.
///
/// The extension match is case-insensitive (`.pdf` and `.PDF` both count).
/// Used by the CLI when no source path was given on the command line.
pub fn find_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, Pdf2WebpError> {
    if !dir.is_dir() {
        return Err(Pdf2WebpError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| Pdf2WebpError::Internal(format!(
        "Failed to read directory '{}': {}",
        dir.display(),
        e
    )))?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_pdf_extension(p))
        .collect();

    pdfs.sort();
    debug!("Found {} PDF files in {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
