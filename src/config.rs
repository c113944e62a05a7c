//! Configuration types for datasheet extraction.
//!
//! Every knob lives in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. The defaults encode the fixed layout of the
//! vendor datasheets (graph on the third page, a 475 × 375 px crop window at
//! 72 DPI) and should only be changed for a different document corpus.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a datasheet extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pump_datasheet::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .render_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.graph_page_index, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Zero-based index of the page holding the performance curve. Default: 2.
    pub graph_page_index: usize,

    /// Documents with fewer pages than this produce no graph artifact. Default: 3.
    pub min_graph_pages: usize,

    /// Pixel window cropped out of the rendered graph page.
    pub crop: CropWindow,

    /// Render scale relative to 72 DPI. Default: 1.0.
    ///
    /// The crop window is measured in pixels of a 72 DPI render; changing the
    /// scale without changing the window crops a different region.
    pub render_scale: f32,

    /// PDF user password for encrypted documents.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            graph_page_index: 2,
            min_graph_pages: 3,
            crop: CropWindow::default(),
            render_scale: 1.0,
            password: None,
            pdfium_library_path: None,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn graph_page_index(mut self, index: usize) -> Self {
        self.config.graph_page_index = index;
        self
    }

    pub fn min_graph_pages(mut self, pages: usize) -> Self {
        self.config.min_graph_pages = pages;
        self
    }

    pub fn crop(mut self, crop: CropWindow) -> Self {
        self.config.crop = crop;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.crop.width() == 0 || c.crop.height() == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "Crop window must be non-empty, got {}",
                c.crop
            )));
        }
        if c.graph_page_index >= c.min_graph_pages {
            return Err(ExtractError::InvalidConfig(format!(
                "Graph page index {} is not covered by the {}-page minimum",
                c.graph_page_index, c.min_graph_pages
            )));
        }
        Ok(self.config)
    }
}

// ── Crop window ──────────────────────────────────────────────────────────

/// A pixel rectangle given as `(left, top, right, bottom)` edges.
///
/// `right` and `bottom` are exclusive, so the default window is 475 × 375 px.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Default for CropWindow {
    fn default() -> Self {
        Self {
            left: 50,
            top: 75,
            right: 525,
            bottom: 450,
        }
    }
}

impl CropWindow {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

impl fmt::Display for CropWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

// ── Variant ──────────────────────────────────────────────────────────────

/// Which datasheet layout a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasheetVariant {
    /// "Blank" catalog sheet: static model specification plus dimension table.
    #[default]
    Catalog,
    /// "Historic" selection-tool sheet: one flow/head operating point.
    DutyPoint,
}

impl DatasheetVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasheetVariant::Catalog => "catalog",
            DatasheetVariant::DutyPoint => "duty_point",
        }
    }
}

impl fmt::Display for DatasheetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasheetVariant {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "catalog" | "blank" => Ok(DatasheetVariant::Catalog),
            "duty_point" | "historic" => Ok(DatasheetVariant::DutyPoint),
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown datasheet variant '{other}' (expected catalog or duty_point)"
            ))),
        }
    }
}
