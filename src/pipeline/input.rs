//! Input resolution: load a datasheet from a path or take an in-memory buffer.
//!
//! The text and graph stages each open their own pdfium document from the
//! same bytes, so the file is read once up front. Only I/O faults are fatal.
//! A file that is not a PDF is still handed to pdfium, which rejects it, and
//! the extraction degrades to an all-default record.

use crate::error::ExtractError;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A datasheet to extract from.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// A PDF on the local file system.
    Path(PathBuf),
    /// PDF bytes already in memory (e.g. an upload body).
    Bytes(Vec<u8>),
}

impl DocumentInput {
    /// A label for log lines: the path, or `<memory>`.
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            DocumentInput::Path(p) => p.to_string_lossy(),
            DocumentInput::Bytes(_) => Cow::Borrowed("<memory>"),
        }
    }
}

impl From<PathBuf> for DocumentInput {
    fn from(path: PathBuf) -> Self {
        DocumentInput::Path(path)
    }
}

impl From<&Path> for DocumentInput {
    fn from(path: &Path) -> Self {
        DocumentInput::Path(path.to_path_buf())
    }
}

impl From<&str> for DocumentInput {
    fn from(path: &str) -> Self {
        DocumentInput::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for DocumentInput {
    fn from(bytes: Vec<u8>) -> Self {
        DocumentInput::Bytes(bytes)
    }
}

/// Return the document bytes, reading the file for path inputs.
pub fn load_bytes(input: DocumentInput) -> Result<Vec<u8>, ExtractError> {
    let bytes = match input {
        DocumentInput::Bytes(bytes) => bytes,
        DocumentInput::Path(path) => read_local(&path)?,
    };

    if !has_pdf_magic(&bytes) {
        warn!("Input does not start with %PDF; extraction will likely yield defaults");
    }
    Ok(bytes)
}

/// `true` when `bytes` begins with the `%PDF` header.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

fn read_local(path: &Path) -> Result<Vec<u8>, ExtractError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ExtractError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
