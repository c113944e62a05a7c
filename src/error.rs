//! Error types for the pump-datasheet library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] is **fatal**. The extraction cannot start at all
//!   (file missing, unreadable, pdfium library not bindable, bad config).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`StageError`] is **non-fatal**. One stage degraded (text layer
//!   unreadable, graph page failed to render) but a record is still
//!   produced. Stored inside [`crate::output::Diagnostics`] so callers can
//!   inspect what went wrong without losing the fields that did extract.
//!
//! A malformed PDF is never fatal. It surfaces as a `StageError` and an
//! all-default record.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pump-datasheet library.
///
/// Stage-level degradations use [`StageError`] and are stored in
/// [`crate::output::Diagnostics`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Datasheet not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the input failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A ZIP archive in a batch could not be opened or unpacked.
    #[error("Archive '{path}' could not be expanded: {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install libpdfium system-wide.\n\
  • Set PDFIUM_DYNAMIC_LIB_PATH=/path/to/libpdfium.\n\
  • Pass --pdfium-lib /path/to/libpdfium to the CLI.\n"
    )]
    EngineUnavailable(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single extraction stage.
///
/// The record is still returned; affected fields hold their defaults.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// pdfium could not open the document or read its text layer.
    #[error("text layer unreadable: {detail}")]
    TextUnreadable { detail: String },

    /// The rotated last page could not be read.
    #[error("rotated last page unreadable: {detail}")]
    RotatedPageUnreadable { detail: String },

    /// The graph page failed to render, crop or encode.
    #[error("graph page {page}: {detail}")]
    GraphFailed { page: usize, detail: String },
}
