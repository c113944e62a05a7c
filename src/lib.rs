//! # pump-datasheet
//!
//! Pull structured records and performance-curve images out of vendor pump
//! datasheet PDFs.
//!
//! Two layouts are supported, selected by [`DatasheetVariant`]:
//!
//! - **Catalog** ("blank") sheets describe one pump model: SKU, name, poles,
//!   rated power, IE class, MEI, weight and the outer dimensions read from a
//!   sideways table on the last page.
//! - **Duty-point** ("historic") sheets describe one operating point of a
//!   model: flow, head, efficiency, absorbed power and NPSH.
//!
//! Both also yield a cropped PNG of the performance curve from page 3.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input       read a local file or take bytes
//!  ├─ 2. Text        full text + last page rotated 90° (pdfium)
//!  ├─ 3. Fields      labelled regex rules → FieldRecord
//!  ├─ 4. Dimensions  fixed-offset sums after the drawing disclaimer (catalog)
//!  ├─ 5. Graph       render page 3 at 72 DPI, crop, PNG-encode
//!  └─ 6. Output      record + optional artifact + diagnostics
//! ```
//!
//! Extraction is best-effort: a phrase that is missing leaves its field at
//! the zero value, and a document pdfium cannot open still returns a record.
//! Only unreadable inputs and a missing pdfium library are errors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pump_datasheet::{extract, DatasheetVariant, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("NBG-125-100-250.pdf", DatasheetVariant::Catalog, &config)?;
//!     println!("{}", serde_json::to_string_pretty(&output.record)?);
//!     if let Some(graph) = &output.graph {
//!         std::fs::write(&graph.filename, &graph.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pumpsheet` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pump-datasheet = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! The library is loaded at runtime. See [`engine`] for how it is found.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CropWindow, DatasheetVariant, ExtractionConfig, ExtractionConfigBuilder};
pub use engine::bind_pdfium;
pub use error::{ExtractError, StageError};
pub use extract::{extract, extract_async, extract_catalog, extract_duty_point, extract_with};
pub use output::{
    CatalogSpecRecord, DedupKey, Diagnostics, DimensionOutcome, DutyPointRecord,
    ExtractionOutput, FieldOutcome, FieldRecord, FieldReport, GraphImageArtifact, GraphOutcome,
};
pub use pipeline::input::DocumentInput;
