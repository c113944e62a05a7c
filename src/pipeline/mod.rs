//! Pipeline stages for datasheet extraction.
//!
//! Each submodule implements exactly one step. The parsers ([`fields`],
//! [`dimensions`]) work on plain text and never touch pdfium, so they are
//! tested without a library present.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──┬──▶ fields ───────┐
//! (path/bytes)     │                  ├──▶ FieldRecord
//!                  └──▶ dimensions ───┘    (catalog only)
//!           └──────▶ graph ──────────────▶ GraphImageArtifact
//! ```
//!
//! 1. [`input`]:      read the document bytes once
//! 2. [`text`]:       full text and the 90°-rotated last page via pdfium
//! 3. [`fields`]:     labelled regex rules per datasheet variant
//! 4. [`dimensions`]: fixed-offset sums after the drawing disclaimer
//! 5. [`graph`]:      render, crop and PNG-encode the curve page

pub mod dimensions;
pub mod fields;
pub mod graph;
pub mod input;
pub mod text;
