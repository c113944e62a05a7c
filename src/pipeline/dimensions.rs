//! Dimension block: outer pump dimensions from the sideways table on the last page.
//!
//! Catalog sheets print a dimension drawing on their final page with the table
//! rotated 90°. After the disclaimer sentence, the table cells linearise into a
//! flat run of numbers. The outer dimensions are sums of fixed cell pairs in that run:
//!
//! ```text
//! length = s[0]  + s[3]
//! width  = s[15] + s[16]
//! height = s[19] + s[20]
//! ```
//!
//! These offsets describe the vendor's table layout. They are not inferred.

use crate::output::DimensionOutcome;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Numbers required after the anchor before any offset is read.
pub const MIN_DIMENSION_TOKENS: usize = 22;

const LENGTH_CELLS: (usize, usize) = (0, 3);
const WIDTH_CELLS: (usize, usize) = (15, 16);
const HEIGHT_CELLS: (usize, usize) = (19, 20);

static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Disclaimer:\s*This\s+simplified\s+dimensional\s+drawing\s+does\s+not\s+show\s+all\s+details\.")
        .unwrap()
});

// ASCII digits only: `\d` would also match digits `f64::from_str` rejects.
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+\.?[0-9]*").unwrap());

/// Outer dimensions in millimetres; all zero when the block is unusable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Locate the anchor in `rotated_text` and derive the three outer dimensions.
///
/// Never fails: a missing anchor or a short number run yields zeros and the
/// matching [`DimensionOutcome`].
pub fn parse_dimensions(rotated_text: &str) -> (Dimensions, DimensionOutcome) {
    let Some(anchor) = RE_ANCHOR.find(rotated_text) else {
        debug!("Dimension anchor not found in rotated last page");
        return (Dimensions::default(), DimensionOutcome::AnchorMissing);
    };

    let tokens: Vec<f64> = RE_NUMBER
        .find_iter(&rotated_text[anchor.end()..])
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    if tokens.len() < MIN_DIMENSION_TOKENS {
        debug!(
            "Dimension block has {} numbers, need {}",
            tokens.len(),
            MIN_DIMENSION_TOKENS
        );
        return (
            Dimensions::default(),
            DimensionOutcome::InsufficientTokens {
                found: tokens.len(),
            },
        );
    }

    let sum = |(a, b): (usize, usize)| tokens[a] + tokens[b];
    let dims = Dimensions {
        length_mm: sum(LENGTH_CELLS),
        width_mm: sum(WIDTH_CELLS),
        height_mm: sum(HEIGHT_CELLS),
    };
    debug!(
        "Dimensions {} x {} x {} mm from {} numbers",
        dims.length_mm,
        dims.width_mm,
        dims.height_mm,
        tokens.len()
    );

    (
        dims,
        DimensionOutcome::Derived {
            tokens: tokens.len(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR: &str = "Disclaimer: This simplified dimensional drawing does not show all details.";

    fn block(values: &[f64]) -> String {
        let body: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        format!("Dimensions\n{ANCHOR}\n{}\n", body.join("\n"))
    }

    #[test]
    fn sums_fixed_offsets() {
        let values: Vec<f64> = (0..22).map(|i| (i * 10) as f64).collect();
        let (dims, outcome) = parse_dimensions(&block(&values));
        assert_eq!(dims.length_mm, 0.0 + 30.0);
        assert_eq!(dims.width_mm, 150.0 + 160.0);
        assert_eq!(dims.height_mm, 190.0 + 200.0);
        assert_eq!(outcome, DimensionOutcome::Derived { tokens: 22 });
    }

    #[test]
    fn realistic_table_values() {
        let values = [
            760.0, 250.0, 180.0, 140.0, 80.0, 125.0, 100.0, 18.0, 24.0, 355.0, 280.0, 500.0,
            400.0, 19.0, 65.0, 235.0, 300.5, 42.0, 12.0, 315.0, 450.0, 9.0, 4.0,
        ];
        let (dims, _) = parse_dimensions(&block(&values));
        assert_eq!(dims.length_mm, 900.0);
        assert_eq!(dims.width_mm, 535.5);
        assert_eq!(dims.height_mm, 765.0);
    }

    #[test]
    fn twenty_one_numbers_are_not_enough() {
        let values: Vec<f64> = (1..=21).map(f64::from).collect();
        let (dims, outcome) = parse_dimensions(&block(&values));
        assert_eq!(dims, Dimensions::default());
        assert_eq!(outcome, DimensionOutcome::InsufficientTokens { found: 21 });
    }

    #[test]
    fn missing_anchor_yields_zeros() {
        let values: Vec<f64> = (1..=40).map(f64::from).collect();
        let text = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let (dims, outcome) = parse_dimensions(&text);
        assert_eq!(dims, Dimensions::default());
        assert_eq!(outcome, DimensionOutcome::AnchorMissing);
    }

    #[test]
    fn numbers_before_anchor_are_ignored() {
        let mut text = String::from("999 888 777\n");
        text.push_str(&block(&(0..22).map(f64::from).collect::<Vec<_>>()));
        let (dims, _) = parse_dimensions(&text);
        assert_eq!(dims.length_mm, 3.0);
    }

    #[test]
    fn anchor_tolerates_line_breaks() {
        let values: Vec<f64> = (0..22).map(f64::from).collect();
        let text = block(&values).replace("dimensional drawing", "dimensional\r\ndrawing");
        let (dims, outcome) = parse_dimensions(&text);
        assert!(matches!(outcome, DimensionOutcome::Derived { .. }));
        assert_eq!(dims.height_mm, 39.0);
    }

    #[test]
    fn non_ascii_digits_are_not_table_cells() {
        let values: Vec<f64> = (0..22).map(|i| (i * 10) as f64).collect();
        let text = block(&values).replace(ANCHOR, &format!("{ANCHOR}\n\u{0661}\u{0662}"));
        let (dims, outcome) = parse_dimensions(&text);
        assert_eq!(outcome, DimensionOutcome::Derived { tokens: 22 });
        assert_eq!(dims.length_mm, 30.0);
        assert_eq!(dims.width_mm, 310.0);
    }

    #[test]
    fn empty_text() {
        assert_eq!(parse_dimensions("").1, DimensionOutcome::AnchorMissing);
    }
}
