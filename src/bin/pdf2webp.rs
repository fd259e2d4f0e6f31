//! CLI binary for pdf2webp.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results. Interactive file selection and
//! logging setup are process-wide concerns, so they live here and never
//! inside the library.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2webp::pipeline::input::find_pdf_files;
use pdf2webp::{
    convert, ConversionConfig, ConversionProgressCallback, PageSelection, Pdf2WebpError,
    ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit code for a user-cancelled interactive prompt, matching the shell
/// convention for SIGINT.
const EXIT_CANCELLED: i32 = 130;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif].
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    /// Count of pages that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_conversion_start` (called before any pages are processed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

/// Format a byte count as a compact human-readable string.
fn human_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual page count.
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, bytes_written: u64) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&human_bytes(bytes_written)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes into document_webp/ beside the PDF)
  pdf2webp document.pdf

  # Choose the output directory
  pdf2webp document.pdf -o slides

  # Print-quality rendering, near-archival quality
  pdf2webp document.pdf -d 600 -q 95

  # Pixel-exact output
  pdf2webp document.pdf --lossless

  # Only a few pages
  pdf2webp --pages 3-15 document.pdf

  # No argument: searches the current directory, prompts if several PDFs
  pdf2webp

OUTPUT:
  One WebP file per page, named by page number and zero-padded to at least
  two digits: 01.webp, 02.webp, …, 10.webp, …, 100.webp. Re-running into the
  same directory overwrites same-numbered files and leaves other files alone.

EXIT CODES:
  0    at least one page converted
  1    validation, not-found, or processing error
  130  interactive selection cancelled

ENVIRONMENT VARIABLES:
  PDF2WEBP_DPI        Default for --dpi
  PDF2WEBP_QUALITY    Default for --quality
  PDF2WEBP_OUTPUT     Default for --output
  RUST_LOG            Overrides the log filter (e.g. RUST_LOG=pdf2webp=debug)

SETUP:
  pdf2webp renders through the pdfium library. Install libpdfium on your
  system or place it next to the binary; both locations are probed at start.
"#;

/// Convert a PDF into per-page WebP images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2webp",
    version,
    about = "Split a PDF into per-page high-quality WebP images",
    long_about = "Render every page of a PDF document to a WebP image at a chosen DPI, \
one numbered file per page. Supports lossy encoding with libwebp's highest-effort \
compression method, lossless encoding for archival, and page selections.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the source PDF. If omitted, the current directory is searched
    /// and a single match is used automatically; several matches open an
    /// interactive prompt.
    pdf_path: Option<PathBuf>,

    /// Destination directory (default: <stem>_webp beside the PDF).
    #[arg(short, long, env = "PDF2WEBP_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (72–1200).
    ///
    /// Checked by the library validator so an out-of-range value reports the
    /// violated bound and exits 1 before any filesystem work.
    #[arg(short, long, env = "PDF2WEBP_DPI", default_value_t = 300)]
    dpi: u32,

    /// Lossy WebP quality (0–100). Ignored with --lossless.
    #[arg(short, long, env = "PDF2WEBP_QUALITY", default_value_t = 90)]
    quality: u8,

    /// Use lossless WebP encoding.
    #[arg(short, long, env = "PDF2WEBP_LOSSLESS")]
    lossless: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2WEBP_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2WEBP_PASSWORD")]
    password: Option<String>,

    /// Output a structured JSON report instead of the text summary.
    #[arg(long, env = "PDF2WEBP_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2WEBP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2WEBP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long, env = "PDF2WEBP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve the source PDF ───────────────────────────────────────────
    let pdf_path = match cli.pdf_path.clone() {
        Some(path) => path,
        None => match locate_pdf_in_cwd(cli.quiet)? {
            Some(path) => path,
            None => {
                eprintln!("Cancelled.");
                std::process::exit(EXIT_CANCELLED);
            }
        },
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&pdf_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if !show_progress {
            // The progress callback already printed the tick line otherwise.
            if output.stats.failed_pages == 0 {
                eprintln!(
                    "Converted {}/{} pages in {}ms",
                    output.stats.converted_pages,
                    output.stats.selected_pages,
                    output.stats.total_duration_ms
                );
            } else {
                eprintln!(
                    "Converted {}/{} pages in {}ms  ({} failed)",
                    output.stats.converted_pages,
                    output.stats.selected_pages,
                    output.stats.total_duration_ms,
                    output.stats.failed_pages
                );
            }
        }
        eprintln!(
            "   {}  →  {}",
            dim(&human_bytes(output.stats.total_bytes)),
            bold(&output.output_dir.display().to_string()),
        );
    }

    Ok(())
}

/// Search the working directory for PDFs when no path was given.
///
/// Returns `Ok(None)` when the user cancelled the interactive prompt.
fn locate_pdf_in_cwd(quiet: bool) -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Cannot determine working directory")?;
    let pdfs = find_pdf_files(&cwd)?;

    match pdfs.len() {
        0 => Err(Pdf2WebpError::NoPdfsFound { dir: cwd }.into()),
        1 => {
            if !quiet {
                let name = pdfs[0]
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                eprintln!("Using the only PDF in {}: {}", cwd.display(), bold(&name));
            }
            Ok(Some(pdfs[0].clone()))
        }
        _ => select_pdf_interactively(&pdfs),
    }
}

/// Numbered prompt over several candidate PDFs.
///
/// Returns `Ok(None)` on 'q' or end-of-input.
fn select_pdf_interactively(files: &[PathBuf]) -> Result<Option<PathBuf>> {
    eprintln!("\nFound several PDF files:");
    eprintln!("{}", "-".repeat(60));
    for (idx, file) in files.iter().enumerate() {
        let size_mb = std::fs::metadata(file)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        eprintln!("  {}. {} ({:.2} MB)", idx + 1, name, size_mb);
    }
    eprintln!("{}", "-".repeat(60));

    let stdin = io::stdin();
    loop {
        eprint!("\nSelect a file (1-{}) or 'q' to quit: ", files.len());
        io::stderr().flush().ok();

        let mut line = String::new();
        let read = stdin
            .read_line(&mut line)
            .context("Failed to read selection")?;
        if read == 0 {
            // End-of-input counts as cancellation.
            return Ok(None);
        }

        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        match choice.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(Some(files[n - 1].clone())),
            _ => eprintln!(
                "Please enter a number between 1 and {}, or 'q' to quit",
                files.len()
            ),
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .quality(cli.quality)
        .lossless(cli.lossless)
        .pages(pages);

    if let Some(ref dir) = cli.output {
        builder = builder.output_dir(dir.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
