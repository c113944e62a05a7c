//! Field extraction: ordered, labelled regex rules over the full document text.
//!
//! Each variant is a table of [`FieldRule`]s. A rule owns one pattern and one
//! converter that writes into the record only when the capture converts
//! cleanly. Rules never depend on each other, so a missing phrase leaves just
//! that field at its zero value and every other rule still runs.
//!
//! Every pattern matches the first occurrence in document order.

use crate::config::DatasheetVariant;
use crate::output::{CatalogSpecRecord, DutyPointRecord, FieldOutcome, FieldRecord, FieldReport};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::debug;

// ── Patterns ─────────────────────────────────────────────────────────────

pub(crate) static RE_SKU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Product No\.\s*:\s*([0-9]+)").unwrap());

/// Family prefix, then letters/digits/spaces/hyphens, then a `/size` suffix.
pub(crate) static RE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(NBG[\w\s-]+/[0-9]+)").unwrap());

static RE_POLES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Number of poles\s*:\s*([0-9]+)").unwrap());

static RE_RATED_POWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Rated power - P2\s*:\s*([0-9.]+)\s*kW").unwrap());

static RE_IE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IE Efficiency class\s*:\s*(\w+)").unwrap());

static RE_MEI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Minimum efficiency index, MEI ≥\s*:\s*([0-9.]+)").unwrap());

static RE_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Gross weight\s*:\s*([0-9.]+)\s*kg").unwrap());

pub(crate) static RE_FLOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Actual calculated flow:\s*([0-9.]+)\s*(l/s|m\^3/h)").unwrap());

pub(crate) static RE_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Resulting head of the pump:\s*([0-9.]+)\s*(kPa)").unwrap());

static RE_EFFICIENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Eta pump\s*=\s*([0-9.]+)\s*%").unwrap());

static RE_ABSORBED_POWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"P2 =\s*([0-9.]+\s*kW)").unwrap());

static RE_NPSH: Lazy<Regex> = Lazy::new(|| Regex::new(r"NPSH =\s*([0-9.]+)\s*kPa").unwrap());

// ── Rule tables ──────────────────────────────────────────────────────────

/// One labelled extraction rule.
///
/// `apply` returns `false` when the capture is present but unusable; it must
/// leave the record untouched in that case.
struct FieldRule<R> {
    field: &'static str,
    pattern: &'static Lazy<Regex>,
    apply: fn(&mut R, &Captures<'_>) -> bool,
}

fn catalog_rules() -> [FieldRule<CatalogSpecRecord>; 7] {
    [
        FieldRule {
            field: "sku",
            pattern: &RE_SKU,
            apply: |r, c| set_string(&mut r.sku, group(c, 1)),
        },
        FieldRule {
            field: "name",
            pattern: &RE_NAME,
            apply: |r, c| set_string(&mut r.name, group(c, 1)),
        },
        FieldRule {
            field: "poles",
            pattern: &RE_POLES,
            apply: |r, c| set_parsed(&mut r.poles, group(c, 1)),
        },
        FieldRule {
            field: "rated_power_kw",
            pattern: &RE_RATED_POWER,
            apply: |r, c| set_parsed(&mut r.rated_power_kw, group(c, 1)),
        },
        FieldRule {
            field: "ie_efficiency_class",
            pattern: &RE_IE_CLASS,
            apply: |r, c| set_string(&mut r.ie_efficiency_class, group(c, 1)),
        },
        FieldRule {
            field: "minimum_efficiency_index",
            pattern: &RE_MEI,
            apply: |r, c| set_parsed(&mut r.minimum_efficiency_index, group(c, 1)),
        },
        FieldRule {
            field: "weight_kg",
            pattern: &RE_WEIGHT,
            apply: |r, c| set_parsed(&mut r.weight_kg, group(c, 1)),
        },
    ]
}

fn duty_point_rules() -> [FieldRule<DutyPointRecord>; 7] {
    [
        FieldRule {
            field: "sku",
            pattern: &RE_SKU,
            apply: |r, c| set_string(&mut r.sku, group(c, 1)),
        },
        FieldRule {
            field: "name",
            pattern: &RE_NAME,
            apply: |r, c| set_string(&mut r.name, group(c, 1)),
        },
        FieldRule {
            field: "flow",
            pattern: &RE_FLOW,
            apply: |r, c| match (parse::<f64>(group(c, 1)), group(c, 2)) {
                (Some(flow), Some(unit)) => {
                    r.flow = flow;
                    r.flow_unit = unit.replace('^', "");
                    true
                }
                _ => false,
            },
        },
        FieldRule {
            field: "head",
            pattern: &RE_HEAD,
            apply: |r, c| match (parse::<f64>(group(c, 1)), group(c, 2)) {
                (Some(head), Some(unit)) => {
                    r.head = head;
                    r.head_unit = unit.to_string();
                    true
                }
                _ => false,
            },
        },
        FieldRule {
            field: "efficiency",
            pattern: &RE_EFFICIENCY,
            apply: |r, c| match group(c, 1) {
                Some(value) => {
                    r.efficiency = format!("{value}%");
                    true
                }
                None => false,
            },
        },
        FieldRule {
            field: "absorbed_power",
            pattern: &RE_ABSORBED_POWER,
            apply: |r, c| set_string(&mut r.absorbed_power, group(c, 1)),
        },
        FieldRule {
            field: "npsh",
            pattern: &RE_NPSH,
            apply: |r, c| set_string(&mut r.npsh, group(c, 1)),
        },
    ]
}

// ── Public API ───────────────────────────────────────────────────────────

/// Parse a catalog sheet's text. Dimensions are left at zero; they come from
/// the rotated last page (see [`super::dimensions`]).
pub fn parse_catalog(text: &str) -> (CatalogSpecRecord, FieldReport) {
    apply_rules(text, &catalog_rules())
}

/// Parse a duty-point sheet's text.
pub fn parse_duty_point(text: &str) -> (DutyPointRecord, FieldReport) {
    apply_rules(text, &duty_point_rules())
}

/// Parse `text` with the rule table of `variant`.
pub fn parse_fields(text: &str, variant: DatasheetVariant) -> (FieldRecord, FieldReport) {
    match variant {
        DatasheetVariant::Catalog => {
            let (record, report) = parse_catalog(text);
            (FieldRecord::Catalog(record), report)
        }
        DatasheetVariant::DutyPoint => {
            let (record, report) = parse_duty_point(text);
            (FieldRecord::DutyPoint(record), report)
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn apply_rules<R: Default>(text: &str, rules: &[FieldRule<R>]) -> (R, FieldReport) {
    let mut record = R::default();
    let mut report = FieldReport::default();

    for rule in rules {
        let outcome = match rule.pattern.captures(text) {
            None => FieldOutcome::Defaulted,
            Some(caps) if (rule.apply)(&mut record, &caps) => FieldOutcome::Matched,
            Some(caps) => {
                debug!(
                    "Field '{}' matched {:?} but could not be converted",
                    rule.field,
                    caps.get(0).map(|m| m.as_str())
                );
                FieldOutcome::Unparsable
            }
        };
        report.push(rule.field, outcome);
    }

    debug!(
        "Parsed {}/{} fields",
        report.matched_count(),
        report.fields.len()
    );
    (record, report)
}

/// A trimmed, non-empty capture group.
fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn parse<T: FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.parse().ok())
}

fn set_string(slot: &mut String, value: Option<&str>) -> bool {
    match value {
        Some(v) => {
            *slot = v.to_string();
            true
        }
        None => false,
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, value: Option<&str>) -> bool {
    match parse(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}
