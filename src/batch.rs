//! Multi-document runs: ZIP expansion, per-document isolation, dedup.
//!
//! A batch never fails as a whole once it has started. Every document gets a
//! [`BatchItem`] carrying its own `Result`, so one corrupt upload cannot hide
//! the others.
//!
//! Documents run one after another on a single pdfium binding. With the
//! `thread_safe` feature every pdfium instance holds one process-wide lock
//! from bind to drop, so parallel tasks would only queue on it.
//!
//! ```rust,no_run
//! use pump_datasheet::{batch, DatasheetVariant, ExtractionConfig};
//!
//! # fn main() -> Result<(), pump_datasheet::ExtractError> {
//! let config = ExtractionConfig::default();
//! let inputs = batch::expand_inputs(&["sheets.zip", "extra.pdf"])?;
//! let mut report = batch::extract_batch(inputs.paths(), DatasheetVariant::DutyPoint, &config)?;
//! report.dedup_by_key();
//! println!("{} ok, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

use crate::config::{DatasheetVariant, ExtractionConfig};
use crate::engine;
use crate::error::ExtractError;
use crate::extract::extract_with;
use crate::output::{DedupKey, ExtractionOutput};
use crate::pipeline::input::{self, DocumentInput};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

// ── Input expansion ──────────────────────────────────────────────────────

/// The PDF paths of a batch, plus the scratch directories they live in.
///
/// Paths unpacked from archives are only valid while this value is alive.
#[derive(Debug)]
pub struct ExpandedInputs {
    pdfs: Vec<PathBuf>,
    _scratch: Vec<TempDir>,
}

impl ExpandedInputs {
    pub fn paths(&self) -> &[PathBuf] {
        &self.pdfs
    }

    pub fn len(&self) -> usize {
        self.pdfs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty()
    }
}

/// Turn user inputs into a list of PDF paths.
///
/// - `.zip` archives are unpacked into a fresh temporary directory; their
///   `.pdf` entries are kept in sorted order.
/// - Directories are walked recursively, also sorted.
/// - Any other path is kept if it has a `.pdf` extension and skipped
///   (with a warning) otherwise.
///
/// Extensions are compared case-insensitively. A path that does not exist is
/// kept so the per-document run reports it.
///
/// # Errors
/// [`ExtractError::ArchiveFailed`] when an archive cannot be read or unpacked.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<ExpandedInputs, ExtractError> {
    let mut pdfs = Vec::new();
    let mut scratch = Vec::new();

    for input in inputs {
        let path = input.as_ref();
        if has_extension(path, "zip") {
            let (dir, mut found) = unpack_zip(path)?;
            info!("Unpacked {} PDFs from {}", found.len(), path.display());
            pdfs.append(&mut found);
            scratch.push(dir);
        } else if path.is_dir() {
            let mut found = Vec::new();
            collect_pdfs(path, &mut found).map_err(|e| ExtractError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            found.sort();
            debug!("Found {} PDFs under {}", found.len(), path.display());
            pdfs.append(&mut found);
        } else if has_extension(path, "pdf") {
            pdfs.push(path.to_path_buf());
        } else {
            warn!("Skipping '{}': not a .pdf or .zip", path.display());
        }
    }

    Ok(ExpandedInputs {
        pdfs,
        _scratch: scratch,
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn collect_pdfs(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_pdfs(&path, out)?;
        } else if has_extension(&path, "pdf") {
            out.push(path);
        }
    }
    Ok(())
}

fn unpack_zip(path: &Path) -> Result<(TempDir, Vec<PathBuf>), ExtractError> {
    let archive_failed = |detail: String| ExtractError::ArchiveFailed {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::open(path).map_err(|e| archive_failed(e.to_string()))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| archive_failed(format!("not a ZIP archive: {e}")))?;
    let dir = tempfile::Builder::new()
        .prefix("pumpsheet-")
        .tempdir()
        .map_err(|e| archive_failed(format!("scratch directory: {e}")))?;

    let mut pdfs = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| archive_failed(format!("entry {i}: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!("Skipping unsafe archive entry '{}'", entry.name());
            continue;
        };
        if !has_extension(&relative, "pdf") {
            debug!("Skipping non-PDF archive entry '{}'", relative.display());
            continue;
        }

        let dest = dir.path().join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| archive_failed(e.to_string()))?;
        }
        let mut out = File::create(&dest).map_err(|e| archive_failed(e.to_string()))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| archive_failed(format!("'{}': {e}", relative.display())))?;
        pdfs.push(dest);
    }

    pdfs.sort();
    Ok((dir, pdfs))
}

// ── Running ──────────────────────────────────────────────────────────────

/// One document's outcome within a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: Result<ExtractionOutput, ExtractError>,
}

/// All outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_err()).count()
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&Path, &ExtractionOutput)> {
        self.items
            .iter()
            .filter_map(|i| i.result.as_ref().ok().map(|o| (i.path.as_path(), o)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ExtractError)> {
        self.items
            .iter()
            .filter_map(|i| i.result.as_ref().err().map(|e| (i.path.as_path(), e)))
    }

    /// Drop successful items whose [`DedupKey`] was already seen earlier in
    /// the batch. Records with an empty SKU are never considered duplicates.
    ///
    /// Returns the paths that were dropped.
    pub fn dedup_by_key(&mut self) -> Vec<PathBuf> {
        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut dropped = Vec::new();

        self.items.retain(|item| {
            let Ok(output) = &item.result else {
                return true;
            };
            if output.record.sku().is_empty() {
                return true;
            }
            if seen.insert(output.record.dedup_key()) {
                true
            } else {
                info!(
                    "Skipping '{}': duplicate of an earlier record ({:?})",
                    item.path.display(),
                    output.record.dedup_key()
                );
                dropped.push(item.path.clone());
                false
            }
        });
        dropped
    }
}

/// Run `extract_one` over every path, one after another.
pub fn run_batch<F>(paths: &[PathBuf], mut extract_one: F) -> BatchReport
where
    F: FnMut(&Path) -> Result<ExtractionOutput, ExtractError>,
{
    let items: Vec<BatchItem> = paths
        .iter()
        .map(|path| {
            let result = extract_one(path);
            if let Err(e) = &result {
                warn!("'{}' failed: {}", path.display(), e);
            }
            BatchItem {
                path: path.clone(),
                result,
            }
        })
        .collect();

    let report = BatchReport { items };
    info!(
        "Batch complete: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    report
}

/// Extract every path sequentially with one pdfium binding.
///
/// # Errors
/// Only [`ExtractError::EngineUnavailable`]; per-document failures are in the
/// report.
pub fn extract_batch(
    paths: &[PathBuf],
    variant: DatasheetVariant,
    config: &ExtractionConfig,
) -> Result<BatchReport, ExtractError> {
    let pdfium = engine::bind_pdfium(config.pdfium_library_path.as_deref())?;
    info!("Extracting {} {} datasheets", paths.len(), variant);
    Ok(run_batch(paths, |path| {
        let bytes = input::load_bytes(DocumentInput::from(path))?;
        Ok(extract_with(&pdfium, &bytes, variant, config))
    }))
}

/// Run [`extract_batch`] on the blocking thread pool.
///
/// The whole batch shares one worker and one pdfium binding.
///
/// # Errors
/// Same as [`extract_batch`], plus [`ExtractError::Internal`] if the worker
/// panics.
pub async fn extract_batch_async(
    paths: Vec<PathBuf>,
    variant: DatasheetVariant,
    config: &ExtractionConfig,
) -> Result<BatchReport, ExtractError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || extract_batch(&paths, variant, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("batch worker panicked: {e}")))?
}
