//! CLI binary for pump-datasheet.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs a batch and prints one JSON record per document.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pump_datasheet::batch::{self, BatchReport};
use pump_datasheet::pipeline::input::{self, DocumentInput};
use pump_datasheet::{
    bind_pdfium, extract_with, DatasheetVariant, ExtractError, ExtractionConfig,
    ExtractionOutput,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

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

const AFTER_HELP: &str = r#"EXAMPLES:
  # One catalog sheet, record on stdout
  pumpsheet NBG-125-100-250.pdf

  # A ZIP of duty-point sheets, graphs and records.json into ./out
  pumpsheet --variant duty-point selection.zip --out-dir out

  # Pretty JSON array instead of JSON lines
  pumpsheet --json sheets/*.pdf > records.json

  # Use a specific pdfium build
  pumpsheet --pdfium-lib /opt/pdfium/lib sheet.pdf

VARIANTS:
  catalog      Static model specs: SKU, name, poles, rated power, IE class,
               MEI, weight and outer dimensions (alias: blank)
  duty-point   One operating point: flow, head, efficiency, absorbed power
               and NPSH (alias: historic)

ENVIRONMENT VARIABLES:
  PDFIUM_DYNAMIC_LIB_PATH  Path to libpdfium (file or directory)
  PUMPSHEET_VARIANT        Default --variant
  PUMPSHEET_OUT_DIR        Default --out-dir
  RUST_LOG                 Log filter (overrides --verbose / --quiet)
"#;

/// Extract specs, duty points and performance curves from pump datasheet PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pumpsheet",
    version,
    about = "Extract specs, duty points and performance curves from pump datasheet PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files, directories or ZIP archives of PDFs.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Datasheet layout of every input.
    #[arg(long, env = "PUMPSHEET_VARIANT", value_enum, default_value = "catalog")]
    variant: VariantArg,

    /// Write graph PNGs and records.json into this directory.
    #[arg(short, long, env = "PUMPSHEET_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Graph render scale relative to 72 DPI (0.25–8.0). The crop window
    /// is defined at 1.0.
    #[arg(long, env = "PUMPSHEET_RENDER_SCALE", default_value_t = 1.0)]
    render_scale: f32,

    /// Path to libpdfium (file or containing directory).
    #[arg(long, env = "PUMPSHEET_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PUMPSHEET_PASSWORD")]
    password: Option<String>,

    /// Keep records whose identity repeats an earlier one in the batch.
    #[arg(long)]
    keep_duplicates: bool,

    /// Print a pretty JSON array instead of one JSON object per line.
    #[arg(long, env = "PUMPSHEET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PUMPSHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PUMPSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and records.
    #[arg(short, long, env = "PUMPSHEET_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    #[value(alias = "blank")]
    Catalog,
    #[value(alias = "historic")]
    DutyPoint,
}

impl From<VariantArg> for DatasheetVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Catalog => DatasheetVariant::Catalog,
            VariantArg::DutyPoint => DatasheetVariant::DutyPoint,
        }
    }
}

/// One line of output: the record or the reason there is none.
#[derive(Serialize)]
struct RecordLine<'a> {
    path: String,
    #[serde(flatten)]
    output: Option<&'a ExtractionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
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

    let config = build_config(&cli)?;
    let variant = DatasheetVariant::from(cli.variant);

    // ── Resolve inputs ───────────────────────────────────────────────────
    let expanded = batch::expand_inputs(cli.inputs.as_slice()).context("Failed to read inputs")?;
    if expanded.is_empty() {
        anyhow::bail!("No PDF files found in the given inputs");
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let start = Instant::now();
    let bar = if show_progress {
        progress_bar(expanded.len())
    } else {
        ProgressBar::hidden()
    };

    // pdfium serialises all work behind one process-wide lock, so the whole
    // batch runs on a single blocking worker with a single binding.
    let paths = expanded.paths().to_vec();
    let task_bar = bar.clone();
    let task_config = config.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(task_config.pdfium_library_path.as_deref())?;
        Ok::<_, ExtractError>(batch::run_batch(&paths, |path| {
            let result = input::load_bytes(DocumentInput::from(path))
                .map(|bytes| extract_with(&pdfium, &bytes, variant, &task_config));
            report_progress(&task_bar, path, &result);
            result
        }))
    })
    .await;
    bar.finish_and_clear();
    let mut report = outcome
        .context("Extraction worker panicked")?
        .context("PDF engine unavailable")?;

    if !cli.keep_duplicates {
        let dropped = report.dedup_by_key();
        if !dropped.is_empty() && !cli.quiet {
            eprintln!("{} skipped {} duplicate records", dim("·"), dropped.len());
        }
    }

    // ── Write outputs ────────────────────────────────────────────────────
    let lines = record_lines(&report);
    print_records(&lines, cli.json)?;

    if let Some(ref dir) = cli.out_dir {
        let written = write_out_dir(dir, &report, &lines)?;
        if !cli.quiet {
            eprintln!(
                "{} wrote {} graphs and records.json to {}",
                dim("·"),
                written,
                bold(&dir.display().to_string())
            );
        }
    }

    // ── Summary ──────────────────────────────────────────────────────────
    let ok = report.succeeded();
    let failed = report.failed();
    if !cli.quiet {
        eprintln!(
            "{}  {}/{} datasheets  {}ms",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&ok.to_string()),
            ok + failed,
            start.elapsed().as_millis()
        );
    }
    if ok == 0 {
        anyhow::bail!("All {} datasheets failed", failed);
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder().render_scale(cli.render_scale);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    builder.build().context("Invalid configuration")
}

fn report_progress(
    bar: &ProgressBar,
    path: &Path,
    result: &std::result::Result<ExtractionOutput, ExtractError>,
) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match result {
        Ok(out) if out.diagnostics.warnings.is_empty() => {
            bar.println(format!("  {} {}", green("✓"), name))
        }
        Ok(out) => bar.println(format!(
            "  {} {}  {}",
            cyan("⚠"),
            name,
            dim(&format!("{} warnings", out.diagnostics.warnings.len()))
        )),
        Err(e) => bar.println(format!("  {} {}  {}", red("✗"), name, red(&e.to_string()))),
    }
    bar.inc(1);
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  \
         [{bar:42.green/238}] {pos:>3}/{len} datasheets  \
         ⏱ {elapsed_precise}  ETA {eta_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix("Extracting");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn record_lines(report: &BatchReport) -> Vec<RecordLine<'_>> {
    report
        .items
        .iter()
        .map(|item| RecordLine {
            path: item.path.display().to_string(),
            output: item.result.as_ref().ok(),
            error: item.result.as_ref().err().map(|e| e.to_string()),
        })
        .collect()
}

fn print_records(lines: &[RecordLine<'_>], pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        let json = serde_json::to_string_pretty(lines).context("Failed to serialise records")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        for line in lines {
            let json = serde_json::to_string(line).context("Failed to serialise record")?;
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Write every graph artifact plus `records.json`. Returns the graph count.
fn write_out_dir(dir: &Path, report: &BatchReport, lines: &[RecordLine<'_>]) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;

    let mut written = 0;
    for (_, output) in report.outputs() {
        if let Some(ref graph) = output.graph {
            write_atomic(&dir.join(&graph.filename), &graph.bytes)?;
            written += 1;
        }
    }

    let json = serde_json::to_vec_pretty(lines).context("Failed to serialise records")?;
    write_atomic(&dir.join("records.json"), &json)?;
    Ok(written)
}

/// Atomic write: write to temp, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write {:?}", tmp_path))?;
    std::fs::rename(&tmp_path, path).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
