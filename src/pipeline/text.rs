//! Text layer reading: full document text and the rotated last page.
//!
//! Catalog sheets print their dimension table sideways on the final page.
//! Rotating that page by 90° before reading its text changes how pdfium
//! linearises the table cells, which is what the dimension parser expects.
//!
//! Nothing here fails the extraction. An unreadable document produces empty
//! text plus a [`StageError`], and every field then takes its default.

use crate::error::StageError;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Both text views of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentText {
    /// Text of every page, in page order, one page per block.
    pub full: String,
    /// Text of the last page read with a 90° rotation applied.
    pub rotated_last_page: String,
    /// 0 when the document could not be opened.
    pub page_count: usize,
    pub warnings: Vec<StageError>,
}

/// Read the full text and the rotated last-page text.
///
/// When the document cannot be opened at all, the rotated read is skipped so
/// the same failure is not reported twice.
pub fn read_document_text(pdfium: &Pdfium, bytes: &[u8], password: Option<&str>) -> DocumentText {
    let mut out = DocumentText::default();

    match full_text(pdfium, bytes, password) {
        Ok((text, pages)) => {
            out.full = text;
            out.page_count = pages;
        }
        Err(e) => {
            warn!("Full text unavailable: {}", e);
            out.warnings.push(e);
            return out;
        }
    }

    match rotated_last_page_text(pdfium, bytes, password) {
        Ok(text) => out.rotated_last_page = text,
        Err(e) => {
            warn!("Rotated last page unavailable: {}", e);
            out.warnings.push(e);
        }
    }

    info!(
        "Read text layer: {} pages, {} chars (+{} rotated)",
        out.page_count,
        out.full.len(),
        out.rotated_last_page.len()
    );
    out
}

/// Concatenate the text of every page. Returns `(text, page_count)`.
///
/// A zero-page document yields `("", 0)`. A page whose text layer cannot be
/// loaded contributes nothing; the remaining pages are still read.
pub fn full_text(
    pdfium: &Pdfium,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<(String, usize), StageError> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| StageError::TextUnreadable {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    let mut text = String::new();

    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(page_text) => {
                text.push_str(&page_text.all());
                text.push('\n');
            }
            Err(e) => warn!("Page {} has no readable text layer: {:?}", idx + 1, e),
        }
    }

    debug!("Full text: {} chars from {} pages", text.len(), page_count);
    Ok((text, page_count))
}

/// Text of the last page after rotating it 90°.
///
/// The rotation only affects the in-memory copy loaded from `bytes`.
pub fn rotated_last_page_text(
    pdfium: &Pdfium,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<String, StageError> {
    let unreadable = |detail: String| StageError::RotatedPageUnreadable { detail };

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| unreadable(format!("{:?}", e)))?;

    let pages = document.pages();
    let count = pages.len();
    if count == 0 {
        return Ok(String::new());
    }

    let mut last = pages
        .get(count - 1)
        .map_err(|e| unreadable(format!("{:?}", e)))?;
    last.set_rotation(PdfPageRenderRotation::Degrees90);

    let text = last
        .text()
        .map_err(|e| unreadable(format!("{:?}", e)))?
        .all();

    debug!("Rotated last page ({}): {} chars", count, text.len());
    Ok(text)
}
