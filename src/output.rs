//! Output types produced by a single extraction call.
//!
//! Everything here is constructed once and never mutated afterwards. The
//! records are deliberately flat so a persistence layer can insert them
//! column-for-column via [`FieldRecord::to_columns`].

use crate::config::DatasheetVariant;
use crate::error::StageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Field records ────────────────────────────────────────────────────────

/// Static specification of one pump model, read from a catalog ("blank") sheet.
///
/// Every field defaults independently: `""`, `0` or `0.0` means the
/// corresponding phrase was not found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpecRecord {
    pub sku: String,
    pub name: String,
    pub poles: u32,
    pub rated_power_kw: f64,
    pub ie_efficiency_class: String,
    pub minimum_efficiency_index: f64,
    pub weight_kg: f64,
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// One flow/head operating point, read from a duty-point ("historic") sheet.
///
/// `efficiency`, `absorbed_power` and `npsh` stay strings so the source
/// formatting (`"68.2%"`, `"5.31 kW"`) reaches the caller unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DutyPointRecord {
    pub sku: String,
    pub name: String,
    pub flow: f64,
    pub flow_unit: String,
    pub head: f64,
    pub head_unit: String,
    pub efficiency: String,
    pub absorbed_power: String,
    pub npsh: String,
}

/// The field record of either variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum FieldRecord {
    Catalog(CatalogSpecRecord),
    DutyPoint(DutyPointRecord),
}

impl FieldRecord {
    pub fn variant(&self) -> DatasheetVariant {
        match self {
            FieldRecord::Catalog(_) => DatasheetVariant::Catalog,
            FieldRecord::DutyPoint(_) => DatasheetVariant::DutyPoint,
        }
    }

    pub fn sku(&self) -> &str {
        match self {
            FieldRecord::Catalog(r) => &r.sku,
            FieldRecord::DutyPoint(r) => &r.sku,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldRecord::Catalog(r) => &r.name,
            FieldRecord::DutyPoint(r) => &r.name,
        }
    }

    pub fn as_catalog(&self) -> Option<&CatalogSpecRecord> {
        match self {
            FieldRecord::Catalog(r) => Some(r),
            FieldRecord::DutyPoint(_) => None,
        }
    }

    pub fn as_duty_point(&self) -> Option<&DutyPointRecord> {
        match self {
            FieldRecord::DutyPoint(r) => Some(r),
            FieldRecord::Catalog(_) => None,
        }
    }

    /// Flatten the record into `column name → value` for a persistence layer.
    ///
    /// The variant tag is not included; callers pick the table by
    /// [`FieldRecord::variant`].
    pub fn to_columns(&self) -> Map<String, Value> {
        let value = match self {
            FieldRecord::Catalog(r) => serde_json::to_value(r),
            FieldRecord::DutyPoint(r) => serde_json::to_value(r),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// The identity a persistence layer deduplicates on.
    ///
    /// Several duty points share one model, so they also key on flow and head.
    pub fn dedup_key(&self) -> DedupKey {
        match self {
            FieldRecord::Catalog(r) => DedupKey::Catalog { sku: r.sku.clone() },
            FieldRecord::DutyPoint(r) => DedupKey::DutyPoint {
                sku: r.sku.clone(),
                flow: r.flow.to_string(),
                head: r.head.to_string(),
            },
        }
    }
}

/// Identity of a record for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Catalog { sku: String },
    DutyPoint { sku: String, flow: String, head: String },
}

// ── Graph artifact ───────────────────────────────────────────────────────

/// A cropped performance-curve image, PNG-encoded in memory.
///
/// The bytes are skipped when serialising; write them through a storage
/// layer under [`GraphImageArtifact::filename`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphImageArtifact {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

// ── Diagnostics ──────────────────────────────────────────────────────────

/// What happened to one field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    /// The pattern matched and the captured value converted cleanly.
    Matched,
    /// The pattern did not match; the field holds its default.
    Defaulted,
    /// The pattern matched but the capture could not be converted; the field
    /// holds its default.
    Unparsable,
}

/// Per-field outcomes of one parsing pass, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldReport {
    pub fields: Vec<(&'static str, FieldOutcome)>,
}

impl FieldReport {
    pub(crate) fn push(&mut self, field: &'static str, outcome: FieldOutcome) {
        self.fields.push((field, outcome));
    }

    pub fn outcome(&self, field: &str) -> Option<FieldOutcome> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, outcome)| *outcome)
    }

    pub fn matched_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, o)| *o == FieldOutcome::Matched)
            .count()
    }

    /// Fields that ended up at their default, for whatever reason.
    pub fn defaulted(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|(_, o)| *o != FieldOutcome::Matched)
            .map(|(name, _)| *name)
    }

    /// `true` when nothing recognisable was found in the text.
    pub fn nothing_matched(&self) -> bool {
        self.matched_count() == 0
    }
}

/// How the dimension block was resolved (catalog sheets only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DimensionOutcome {
    /// Enough numeric tokens followed the anchor; dimensions were summed.
    Derived { tokens: usize },
    /// The disclaimer anchor was not in the rotated last-page text.
    AnchorMissing,
    /// The anchor was found but too few numbers followed it.
    InsufficientTokens { found: usize },
}

/// How the graph stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GraphOutcome {
    Extracted,
    TooFewPages { pages: usize },
    /// Rendering, cropping or encoding failed; see the warnings.
    Failed,
}

/// Everything a caller may want to know about how a record came to be.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Page count as seen by pdfium; 0 when the document could not be opened.
    pub page_count: usize,
    pub fields: FieldReport,
    pub dimensions: Option<DimensionOutcome>,
    pub graph: GraphOutcome,
    pub warnings: Vec<StageError>,
    pub duration_ms: u64,
}

/// The unit of output of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutput {
    pub record: FieldRecord,
    pub graph: Option<GraphImageArtifact>,
    pub diagnostics: Diagnostics,
}

impl ExtractionOutput {
    /// Drop diagnostics and return the `(record, artifact)` pair.
    pub fn into_pair(self) -> (FieldRecord, Option<GraphImageArtifact>) {
        (self.record, self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(sku: &str, flow: f64, head: f64) -> FieldRecord {
        FieldRecord::DutyPoint(DutyPointRecord {
            sku: sku.into(),
            flow,
            head,
            ..Default::default()
        })
    }

    #[test]
    fn catalog_columns_are_flat() {
        let record = FieldRecord::Catalog(CatalogSpecRecord {
            sku: "98765432".into(),
            poles: 4,
            rated_power_kw: 7.5,
            ..Default::default()
        });
        let cols = record.to_columns();
        assert_eq!(cols["sku"], Value::from("98765432"));
        assert_eq!(cols["poles"], Value::from(4));
        assert_eq!(cols["rated_power_kw"], Value::from(7.5));
        assert_eq!(cols["length_mm"], Value::from(0.0));
        assert!(!cols.contains_key("variant"));
        assert_eq!(cols.len(), 10);
    }

    #[test]
    fn record_serialises_with_variant_tag() {
        let json = serde_json::to_string(&duty("1", 1.0, 2.0)).unwrap();
        assert!(json.contains(r#""variant":"duty_point""#), "got: {json}");
        let back: FieldRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.variant(), DatasheetVariant::DutyPoint);
    }

    #[test]
    fn duty_points_of_one_model_have_distinct_keys() {
        assert_ne!(duty("42", 12.5, 300.0).dedup_key(), duty("42", 12.5, 310.0).dedup_key());
        assert_eq!(duty("42", 12.5, 300.0).dedup_key(), duty("42", 12.5, 300.0).dedup_key());
    }

    #[test]
    fn artifact_bytes_not_serialised() {
        let artifact = GraphImageArtifact {
            filename: "1-NBG_graph.png".into(),
            width: 2,
            height: 2,
            bytes: vec![1, 2, 3],
        };
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(!json.contains("bytes"), "got: {json}");
    }

    #[test]
    fn field_report_queries() {
        let mut report = FieldReport::default();
        report.push("sku", FieldOutcome::Matched);
        report.push("name", FieldOutcome::Defaulted);
        report.push("poles", FieldOutcome::Unparsable);
        assert_eq!(report.matched_count(), 1);
        assert_eq!(report.outcome("poles"), Some(FieldOutcome::Unparsable));
        assert_eq!(report.outcome("weight_kg"), None);
        assert_eq!(report.defaulted().collect::<Vec<_>>(), vec!["name", "poles"]);
        assert!(!report.nothing_matched());
    }
}
