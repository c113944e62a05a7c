//! pdfium binding.
//!
//! `pdfium-render` loads libpdfium dynamically. A failed bind is the one
//! engine problem the extractor cannot work around, so it is reported as a
//! fatal [`ExtractError::EngineUnavailable`] instead of the panic that
//! `Pdfium::default()` would raise.
//!
//! Discovery order:
//! 1. An explicit path (from [`crate::ExtractionConfig::pdfium_library_path`])
//! 2. `PDFIUM_DYNAMIC_LIB_PATH`
//! 3. The system library search path
//!
//! A path may name the library file itself or the directory containing it.

use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an existing libpdfium.
pub const PDFIUM_PATH_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Bind to a pdfium library following the discovery order above.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ExtractError> {
    if let Some(path) = explicit {
        return bind_pdfium_from_path(path);
    }

    if let Ok(path) = std::env::var(PDFIUM_PATH_ENV) {
        if !path.is_empty() {
            debug!("Loading pdfium from {}={}", PDFIUM_PATH_ENV, path);
            return bind_pdfium_from_path(Path::new(&path));
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractError::EngineUnavailable(format!("system library: {e}")))
}

/// Bind to the pdfium library at `path` (file or containing directory).
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, ExtractError> {
    let lib_path = library_file(path);
    debug!("Binding pdfium from {}", lib_path.display());
    Pdfium::bind_to_library(&lib_path)
        .map(Pdfium::new)
        .map_err(|e| ExtractError::EngineUnavailable(format!("{}: {e}", lib_path.display())))
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        let dir = path.to_string_lossy();
        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&*dir))
    } else {
        path.to_path_buf()
    }
}
