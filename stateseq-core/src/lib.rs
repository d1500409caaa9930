//! Core model for state sequence charts: rows, sequences, per-category domains.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod chart;
pub mod ingest;
pub mod layout;
pub mod scale;
pub mod svg;

pub use chart::{ChartPhase, ChartRenderer, DataSource, LoadRequest, LoadTicket, SequenceChart};
pub use ingest::DatasetBuilder;
pub use layout::{AxisLayout, ChartLayout, ColumnLayout, RectLayout, Tick};
pub use scale::LinearScale;

/// Delimiter used for list-valued columns when the caller does not supply one.
pub const DEFAULT_DELIMITER: &str = "-";

/// Names of the five columns a state sequence table must provide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMap {
    /// Column holding the delimiter-joined state names.
    pub states: String,
    /// Column holding the delimiter-joined state start values.
    pub starts: String,
    /// Column holding the delimiter-joined state durations.
    pub durations: String,
    /// Column holding the sequence category (e.g. treatment).
    pub category: String,
    /// Column holding the sequence id, unique within its category.
    pub sequence_id: String,
}

impl ColumnMap {
    pub fn new(
        states: impl Into<String>,
        starts: impl Into<String>,
        durations: impl Into<String>,
        category: impl Into<String>,
        sequence_id: impl Into<String>,
    ) -> Self {
        Self {
            states: states.into(),
            starts: starts.into(),
            durations: durations.into(),
            category: category.into(),
            sequence_id: sequence_id.into(),
        }
    }

    /// Column names in the order they are validated against a header.
    pub fn names(&self) -> [&str; 5] {
        [
            &self.states,
            &self.starts,
            &self.durations,
            &self.category,
            &self.sequence_id,
        ]
    }
}

/// One unparsed record from the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub states: String,
    pub starts: String,
    pub durations: String,
    pub category: String,
    pub sequence_id: String,
}

/// A single state within a sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateEntry {
    pub state: String,
    pub start: f64,
    pub duration: f64,
}

impl StateEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A parsed row: the ordered states of one sequence in one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceRecord {
    pub category: String,
    pub sequence_id: String,
    pub states: Vec<StateEntry>,
}

/// Closed numeric range `[min, max]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Widen to include both `a` and `b`, in either order.
    pub fn cover(&mut self, a: f64, b: f64) {
        self.min = self.min.min(a).min(b);
        self.max = self.max.max(a).max(b);
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Axis bounds for one category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryDomain {
    /// `[0, number of sequences ingested]`.
    pub x: Extent,
    /// Covers every `[start, start + duration]` seen in the category.
    pub y: Extent,
}

/// Why a row was left out of a [`Dataset`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRow {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub reason: String,
}

/// Category-grouped sequences with their axis domains.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub categories: Vec<String>,
    pub records_by_category: HashMap<String, Vec<SequenceRecord>>,
    pub domains: HashMap<String, CategoryDomain>,
    pub sequence_ids: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub skipped: Vec<SkippedRow>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.domains.contains_key(category)
    }

    /// Records of `category` in ingestion order.
    pub fn records(&self, category: &str) -> &[SequenceRecord] {
        self.records_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn domain(&self, category: &str) -> Option<&CategoryDomain> {
        self.domains.get(category)
    }

    /// Unique sequence ids of `category` in first-seen order.
    pub fn sequence_ids(&self, category: &str) -> &[String] {
        self.sequence_ids
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of records across all categories.
    pub fn record_count(&self) -> usize {
        self.records_by_category.values().map(Vec::len).sum()
    }

    /// Per-category overview in category order.
    pub fn summary(&self) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .filter_map(|category| {
                let domain = self.domains.get(category)?;
                Some(CategorySummary {
                    category: category.clone(),
                    sequences: self.records(category).len(),
                    unique_ids: self.sequence_ids(category).len(),
                    domain: *domain,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub sequences: usize,
    pub unique_ids: usize,
    pub domain: CategoryDomain,
}

/// Space reserved around the drawable area, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 10.0,
            bottom: 10.0,
            left: 50.0,
        }
    }
}

/// Presentation settings for a chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartConfig {
    pub margins: Margins,
    /// Fraction of an x slot covered by a sequence column.
    pub column_fill: f64,
    /// Pixels trimmed from each state rectangle so neighbours stay apart.
    pub rect_gap: f64,
    pub default_fill: String,
    /// Approximate number of ticks on the y axis.
    pub y_tick_count: usize,
    /// Fill overrides keyed by state name.
    #[serde(default)]
    pub state_fills: HashMap<String, String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            column_fill: 0.9,
            rect_gap: 0.5,
            default_fill: "grey".to_string(),
            y_tick_count: 10,
            state_fills: HashMap::new(),
        }
    }
}

impl ChartConfig {
    pub fn fill_for(&self, state: &str) -> &str {
        self.state_fills
            .get(state)
            .map(String::as_str)
            .unwrap_or(&self.default_fill)
    }
}

/// Errors raised while loading or drawing a chart.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("missing column `{0}` in data source")]
    MissingColumn(String),
    #[error("row {row}: sequence lengths differ (states {states}, starts {starts}, durations {durations})")]
    MalformedRow {
        row: usize,
        states: usize,
        starts: usize,
        durations: usize,
    },
    #[error("row {row}: `{value}` in column {column} is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: empty state sequence")]
    EmptySequence { row: usize },
    #[error("could not read data: {0}")]
    Parse(String),
    #[error("could not fetch data: {0}")]
    Fetch(String),
    #[error("no categories found in data source")]
    NoCategories,
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("data has not been loaded yet")]
    NotLoaded,
    #[error("render failed: {0}")]
    Render(String),
}

impl ChartError {
    /// Row-level failures that skip a single row instead of failing the load.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            ChartError::MalformedRow { .. }
                | ChartError::InvalidNumber { .. }
                | ChartError::EmptySequence { .. }
        )
    }
}
