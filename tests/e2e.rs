//! End-to-end integration tests for pdf2webp.
//!
//! These tests drive the full pipeline through pdfium and therefore need a
//! pdfium shared library available at runtime. They are gated behind the
//! `E2E_ENABLED` environment variable so plain `cargo test` stays green on
//! machines without libpdfium.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! The PDFs under test are synthesised in-memory: blank pages with a known
//! MediaBox are all the pipeline needs, and they keep the repository free of
//! binary fixtures.

use pdf2webp::{convert, ConversionConfig, PageSelection};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Build a minimal but well-formed PDF with `page_count` blank pages.
///
/// Every page is 200×100 pt, so pixel dimensions at a given DPI are easy to
/// predict (72 DPI → 200×100 px). Offsets in the xref table are computed,
/// not hard-coded, so the file parses without xref repair.
fn minimal_pdf(page_count: usize) -> Vec<u8> {
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + i)).collect();

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        ),
    ];
    for _ in 0..page_count {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>".to_string());
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}

fn write_pdf(dir: &Path, name: &str, page_count: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, minimal_pdf(page_count)).expect("write test PDF");
    path
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read output dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn decoded_width(path: &Path) -> u32 {
    let bytes = fs::read(path).expect("read webp");
    webp::Decoder::new(&bytes)
        .decode()
        .expect("valid webp")
        .width()
}

// ── Full-pipeline tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn converts_every_page_in_order() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 3);
    let out = dir.path().join("out");

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.expect("conversion succeeds");

    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.converted_pages, 3);
    assert_eq!(output.stats.failed_pages, 0);
    assert!(output.pages.iter().all(|p| p.is_success()));

    let expected: Vec<PathBuf> = ["01.webp", "02.webp", "03.webp"]
        .iter()
        .map(|n| out.join(n))
        .collect();
    assert_eq!(output.files, expected);
    for file in &output.files {
        assert!(file.exists(), "missing {}", file.display());
    }
    assert_eq!(file_names(&out), vec!["01.webp", "02.webp", "03.webp"]);
}

#[tokio::test]
async fn default_output_dir_derived_from_stem() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf", 1);

    let config = ConversionConfig::default();
    let output = convert(&pdf, &config).await.expect("conversion succeeds");

    assert_eq!(output.output_dir, dir.path().join("report_webp"));
    assert!(dir.path().join("report_webp").join("01.webp").exists());
}

#[tokio::test]
async fn rerun_overwrites_same_numbers_and_keeps_stale_files() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 2);
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    // Simulate leftovers from an earlier, larger run.
    fs::write(out.join("01.webp"), b"stale junk").unwrap();
    fs::write(out.join("07.webp"), b"stale seven").unwrap();

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .build()
        .unwrap();
    convert(&pdf, &config).await.expect("conversion succeeds");

    // 01.webp was overwritten with a real WebP file.
    let first = fs::read(out.join("01.webp")).unwrap();
    assert_eq!(&first[0..4], b"RIFF");

    // 07.webp is outside this run and must be untouched.
    assert_eq!(fs::read(out.join("07.webp")).unwrap(), b"stale seven");
}

#[tokio::test]
async fn page_range_keeps_true_page_numbers_in_filenames() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 4);
    let out = dir.path().join("out");

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .pages(PageSelection::Range(2, 3))
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.expect("conversion succeeds");

    assert_eq!(output.stats.total_pages, 4);
    assert_eq!(output.stats.selected_pages, 2);
    assert_eq!(file_names(&out), vec!["02.webp", "03.webp"]);
}

#[tokio::test]
async fn lossless_flag_switches_container_to_vp8l() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 1);
    let out = dir.path().join("out");

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .lossless(true)
        .build()
        .unwrap();
    convert(&pdf, &config).await.expect("conversion succeeds");

    let bytes = fs::read(out.join("01.webp")).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");
    assert_eq!(&bytes[12..16], b"VP8L");
}

#[tokio::test]
async fn doubling_dpi_doubles_pixel_dimensions() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 1);
    let out72 = dir.path().join("out72");
    let out144 = dir.path().join("out144");

    for (dpi, out) in [(72u32, &out72), (144u32, &out144)] {
        let config = ConversionConfig::builder()
            .dpi(dpi)
            .output_dir(out)
            .build()
            .unwrap();
        convert(&pdf, &config).await.expect("conversion succeeds");
    }

    let w72 = decoded_width(&out72.join("01.webp"));
    let w144 = decoded_width(&out144.join("01.webp"));

    // 200 pt page → 200 px at 72 DPI, 400 px at 144 DPI (± rounding).
    assert!((w72 as i64 - 200).abs() <= 1, "got {w72}");
    assert!((w144 as i64 - 2 * w72 as i64).abs() <= 2, "got {w144} vs {w72}");
}

#[tokio::test]
async fn single_bad_page_is_skipped_not_fatal() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 3);
    let out = dir.path().join("out");

    // A directory squatting on page 2's filename makes that page's write
    // fail while pages 1 and 3 proceed normally.
    fs::create_dir_all(out.join("02.webp")).unwrap();

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .build()
        .unwrap();
    let output = convert(&pdf, &config).await.expect("run still succeeds");

    assert_eq!(output.stats.converted_pages, 2);
    assert_eq!(output.stats.failed_pages, 1);
    assert_eq!(
        output.files,
        vec![out.join("01.webp"), out.join("03.webp")]
    );

    let failed = &output.pages[1];
    assert_eq!(failed.page_num, 2);
    assert!(failed.error.is_some());
    assert!(failed.path.is_none());
}

#[tokio::test]
async fn zero_page_document_is_fatal_and_writes_nothing() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "empty.pdf", 0);
    let out = dir.path().join("out");

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .build()
        .unwrap();
    let result = convert(&pdf, &config).await;

    assert!(result.is_err(), "a page-less document must fail the run");
    if out.exists() {
        assert!(file_names(&out).is_empty(), "no output files expected");
    }
}

#[tokio::test]
async fn selection_beyond_document_is_fatal() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 2);
    let out = dir.path().join("out");

    let config = ConversionConfig::builder()
        .output_dir(&out)
        .pages(PageSelection::Single(10))
        .build()
        .unwrap();
    let result = convert(&pdf, &config).await;

    assert!(result.is_err());
    assert!(file_names(&out).is_empty());
}

#[tokio::test]
async fn lossy_and_lossless_outputs_differ() {
    e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "doc.pdf", 1);
    let lossy_out = dir.path().join("lossy");
    let lossless_out = dir.path().join("lossless");

    let lossy = ConversionConfig::builder()
        .quality(100)
        .output_dir(&lossy_out)
        .build()
        .unwrap();
    let lossless = ConversionConfig::builder()
        .lossless(true)
        .output_dir(&lossless_out)
        .build()
        .unwrap();

    convert(&pdf, &lossy).await.expect("lossy conversion");
    convert(&pdf, &lossless).await.expect("lossless conversion");

    let a = fs::read(lossy_out.join("01.webp")).unwrap();
    let b = fs::read(lossless_out.join("01.webp")).unwrap();
    assert_ne!(a, b, "lossy and lossless encodings should not be identical");
}
