//! Extraction entry points.
//!
//! One call turns one datasheet into one [`ExtractionOutput`]. The stages run
//! strictly in order on the calling thread: text, fields, dimensions (catalog
//! only), graph. pdfium work is blocking, so the async wrapper moves the whole
//! call onto `spawn_blocking`.
//!
//! Only two things are fatal: the input cannot be read, or pdfium cannot be
//! bound. A document pdfium rejects still produces an all-default record,
//! with the reason in [`Diagnostics::warnings`].

use crate::config::{DatasheetVariant, ExtractionConfig};
use crate::engine;
use crate::error::ExtractError;
use crate::output::{Diagnostics, ExtractionOutput, FieldRecord};
use crate::pipeline::graph::{self, GraphLabel};
use crate::pipeline::input::{self, DocumentInput};
use crate::pipeline::{dimensions, fields, text};
use pdfium_render::prelude::Pdfium;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the record and graph image of one datasheet.
///
/// Binds pdfium per call (see [`crate::engine`] for the discovery order).
/// Batch callers should bind once and use [`extract_with`].
///
/// # Errors
/// - [`ExtractError::FileNotFound`] / [`ExtractError::PermissionDenied`] /
///   [`ExtractError::ReadFailed`] when the path cannot be read
/// - [`ExtractError::EngineUnavailable`] when libpdfium cannot be loaded
pub fn extract(
    input: impl Into<DocumentInput>,
    variant: DatasheetVariant,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input = input.into();
    info!("Starting {} extraction: {}", variant, input.label());

    let bytes = input::load_bytes(input)?;
    let pdfium = engine::bind_pdfium(config.pdfium_library_path.as_deref())?;
    Ok(extract_with(&pdfium, &bytes, variant, config))
}

/// Extract a catalog ("blank") sheet.
pub fn extract_catalog(
    input: impl Into<DocumentInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    extract(input, DatasheetVariant::Catalog, config)
}

/// Extract a duty-point ("historic") sheet.
pub fn extract_duty_point(
    input: impl Into<DocumentInput>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    extract(input, DatasheetVariant::DutyPoint, config)
}

/// Run [`extract`] on the blocking thread pool.
pub async fn extract_async(
    input: impl Into<DocumentInput>,
    variant: DatasheetVariant,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input = input.into();
    let config = config.clone();
    tokio::task::spawn_blocking(move || extract(input, variant, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("extraction task panicked: {e}")))?
}

/// Extract from bytes with an already-bound pdfium instance.
///
/// Infallible: every stage failure is downgraded to defaults plus a warning.
pub fn extract_with(
    pdfium: &Pdfium,
    bytes: &[u8],
    variant: DatasheetVariant,
    config: &ExtractionConfig,
) -> ExtractionOutput {
    let start = Instant::now();

    // ── Step 1: Text layer ───────────────────────────────────────────────
    let doc_text = text::read_document_text(pdfium, bytes, config.password.as_deref());
    let mut warnings = doc_text.warnings;

    // ── Step 2: Fields ───────────────────────────────────────────────────
    let (mut record, field_report) = fields::parse_fields(&doc_text.full, variant);

    // ── Step 3: Dimensions (catalog only) ────────────────────────────────
    let dimension_outcome = match &mut record {
        FieldRecord::Catalog(catalog) => {
            let (dims, outcome) = dimensions::parse_dimensions(&doc_text.rotated_last_page);
            catalog.length_mm = dims.length_mm;
            catalog.width_mm = dims.width_mm;
            catalog.height_mm = dims.height_mm;
            Some(outcome)
        }
        FieldRecord::DutyPoint(_) => None,
    };

    // ── Step 4: Graph image ──────────────────────────────────────────────
    let filename = GraphLabel::from_text(&doc_text.full, variant).filename();
    debug!("Graph filename: {}", filename);
    let graph_stage = graph::extract_graph(pdfium, bytes, filename, config);
    warnings.extend(graph_stage.warning);

    let diagnostics = Diagnostics {
        page_count: doc_text.page_count,
        fields: field_report,
        dimensions: dimension_outcome,
        graph: graph_stage.outcome,
        warnings,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: sku='{}', {}/{} fields, graph={}, {} warnings, {}ms",
        record.sku(),
        diagnostics.fields.matched_count(),
        diagnostics.fields.fields.len(),
        graph_stage.artifact.is_some(),
        diagnostics.warnings.len(),
        diagnostics.duration_ms
    );

    ExtractionOutput {
        record,
        graph: graph_stage.artifact,
        diagnostics,
    }
}
