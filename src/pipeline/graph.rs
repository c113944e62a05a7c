//! Performance-curve image: render the graph page, crop it, PNG-encode it.
//!
//! The vendor layout puts the pump curve on the third page at a fixed pixel
//! position of a 72 DPI render, so the page is rendered at
//! `render_scale × 72 DPI` (1.0 by default) and cut with
//! [`CropWindow`](crate::config::CropWindow). The result stays in memory.
//! Writing it anywhere is up to the caller.
//!
//! ## Naming
//!
//! File names are built from the raw phrases in the document text, so that
//! every duty point of one model gets its own file:
//!
//! ```text
//! catalog     {sku}-{name}_graph.png
//! duty point  {sku}-{name}-{flow}{flow_unit}-{head}{head_unit}_graph.png
//! ```

use crate::config::{CropWindow, DatasheetVariant, ExtractionConfig};
use crate::error::StageError;
use crate::output::{GraphImageArtifact, GraphOutcome};
use crate::pipeline::fields::{RE_FLOW, RE_HEAD, RE_NAME, RE_SKU};
use image::DynamicImage;
use pdfium_render::prelude::*;
use regex::Regex;
use std::io::Cursor;
use tracing::{debug, info, warn};

// ── Naming ───────────────────────────────────────────────────────────────

/// The identifying phrases a graph file name is built from.
///
/// Missing phrases are replaced by `unknown_*` placeholders, so a name is
/// always produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphLabel {
    pub variant: DatasheetVariant,
    pub sku: String,
    pub name: String,
    pub flow: String,
    pub flow_unit: String,
    pub head: String,
    pub head_unit: String,
}

impl GraphLabel {
    /// Pull the naming phrases out of the full document text.
    pub fn from_text(text: &str, variant: DatasheetVariant) -> Self {
        let first = |re: &Regex, group: usize, fallback: &str| -> String {
            re.captures(text)
                .and_then(|c| c.get(group))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            variant,
            sku: first(&RE_SKU, 1, "unknown_sku"),
            name: first(&RE_NAME, 1, "unknown_name"),
            flow: first(&RE_FLOW, 1, "unknown_flow"),
            flow_unit: first(&RE_FLOW, 2, "unknown_flow_unit"),
            head: first(&RE_HEAD, 1, "unknown_head"),
            head_unit: first(&RE_HEAD, 2, "unknown_head_unit"),
        }
    }

    /// The artifact file name for this label.
    pub fn filename(&self) -> String {
        let name = sanitize_name(&self.name);
        match self.variant {
            DatasheetVariant::Catalog => format!("{}-{}_graph.png", self.sku, name),
            DatasheetVariant::DutyPoint => format!(
                "{}-{}-{}{}-{}{}_graph.png",
                self.sku,
                name,
                self.flow,
                sanitize_unit(&self.flow_unit),
                self.head,
                sanitize_unit(&self.head_unit),
            ),
        }
    }
}

/// Collapse whitespace runs (line breaks included) to one space and replace
/// path separators in a model name.
fn sanitize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['/', '\\'], "-")
}

/// `l/s` → `l-s`, `m^3/h` → `m3-h`.
fn sanitize_unit(unit: &str) -> String {
    unit.replace('^', "").replace(['/', '\\'], "-")
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Result of the graph stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphExtraction {
    pub artifact: Option<GraphImageArtifact>,
    pub outcome: GraphOutcome,
    pub warning: Option<StageError>,
}

/// Render, crop and encode the graph page of the document in `bytes`.
///
/// Never fails: too few pages and any engine/image error both yield
/// `artifact: None`, the latter with a warning attached.
pub fn extract_graph(
    pdfium: &Pdfium,
    bytes: &[u8],
    filename: String,
    config: &ExtractionConfig,
) -> GraphExtraction {
    let page_num = config.graph_page_index + 1;

    match render_cropped(pdfium, bytes, config) {
        Ok(Rendered::TooFewPages(pages)) => {
            warn!(
                "Document has {} pages, graph needs at least {}; no artifact",
                pages, config.min_graph_pages
            );
            GraphExtraction {
                artifact: None,
                outcome: GraphOutcome::TooFewPages { pages },
                warning: None,
            }
        }
        Ok(Rendered::Image(image)) => match encode_png(&image) {
            Ok(png) => {
                info!(
                    "Extracted graph '{}' ({}x{} px, {} bytes)",
                    filename,
                    image.width(),
                    image.height(),
                    png.len()
                );
                GraphExtraction {
                    artifact: Some(GraphImageArtifact {
                        filename,
                        width: image.width(),
                        height: image.height(),
                        bytes: png,
                    }),
                    outcome: GraphOutcome::Extracted,
                    warning: None,
                }
            }
            Err(e) => failed(page_num, format!("PNG encoding failed: {e}")),
        },
        Err(detail) => failed(page_num, detail),
    }
}

enum Rendered {
    TooFewPages(usize),
    Image(DynamicImage),
}

fn failed(page: usize, detail: String) -> GraphExtraction {
    let warning = StageError::GraphFailed { page, detail };
    warn!("Graph extraction failed: {}", warning);
    GraphExtraction {
        artifact: None,
        outcome: GraphOutcome::Failed,
        warning: Some(warning),
    }
}

fn render_cropped(
    pdfium: &Pdfium,
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<Rendered, String> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, config.password.as_deref())
        .map_err(|e| format!("document could not be opened: {:?}", e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages < config.min_graph_pages {
        return Ok(Rendered::TooFewPages(total_pages));
    }

    let idx = u16::try_from(config.graph_page_index)
        .map_err(|_| format!("page index {} exceeds u16", config.graph_page_index))?;
    let page = pages.get(idx).map_err(|e| format!("{:?}", e))?;

    let width_px = ((page.width().value * config.render_scale).round() as i32).max(1);
    let height_px = ((page.height().value * config.render_scale).round() as i32).max(1);
    let render_config = PdfRenderConfig::new()
        .set_target_width(width_px)
        .set_maximum_height(height_px);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| format!("render failed: {:?}", e))?;
    let rendered = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        config.graph_page_index + 1,
        rendered.width(),
        rendered.height()
    );

    crop(&rendered, &config.crop).map(Rendered::Image)
}

/// Cut `window` out of `image`, clamping the far edges to the image bounds.
///
/// Fails only when the window starts outside the image.
pub fn crop(image: &DynamicImage, window: &CropWindow) -> Result<DynamicImage, String> {
    let (w, h) = (image.width(), image.height());
    if window.left >= w || window.top >= h {
        return Err(format!("crop window {window} lies outside the {w}x{h} px page"));
    }
    let width = window.width().min(w - window.left);
    let height = window.height().min(h - window.top);
    Ok(image.crop_imm(window.left, window.top, width, height))
}

/// PNG-encode an image into memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}
