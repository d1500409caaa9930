//! Delimited text to [`Dataset`] loader.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use stateseq_core::{
    CategorySummary, ChartError, ColumnMap, Dataset, DatasetBuilder, RawRow, SkippedRow,
};

/// Load a dataset from CSV text with a header row.
pub fn load_str(text: &str, columns: &ColumnMap, delimiter: &str) -> Result<Dataset, ChartError> {
    load_reader(text.as_bytes(), columns, delimiter)
}

/// Load a dataset from any CSV reader with a header row.
///
/// A missing column fails the whole load. Bad rows are skipped and listed
/// in [`Dataset::skipped`].
pub fn load_reader<R: Read>(
    reader: R,
    columns: &ColumnMap,
    delimiter: &str,
) -> Result<Dataset, ChartError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|err| ChartError::Parse(err.to_string()))?
        .clone();
    let index = ColumnIndex::resolve(&headers, columns)?;

    let mut builder = DatasetBuilder::new(delimiter);
    for result in rdr.records() {
        let record = result.map_err(|err| ChartError::Parse(err.to_string()))?;
        let _ = builder.push_row(&index.extract(&record));
    }
    Ok(builder.finish())
}

/// Header positions of the five required columns.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    states: usize,
    starts: usize,
    durations: usize,
    category: usize,
    sequence_id: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnMap) -> Result<Self, ChartError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| ChartError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            states: find(&columns.states)?,
            starts: find(&columns.starts)?,
            durations: find(&columns.durations)?,
            category: find(&columns.category)?,
            sequence_id: find(&columns.sequence_id)?,
        })
    }

    /// Short records read missing fields as empty.
    fn extract(&self, record: &StringRecord) -> RawRow {
        let field = |index: usize| record.get(index).unwrap_or_default().to_string();
        RawRow {
            states: field(self.states),
            starts: field(self.starts),
            durations: field(self.durations),
            category: field(self.category),
            sequence_id: field(self.sequence_id),
        }
    }
}

/// Serializable overview of a loaded dataset.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadSummary {
    pub sequences: usize,
    pub categories: Vec<CategorySummary>,
    pub skipped: Vec<SkippedRow>,
}

impl From<&Dataset> for LoadSummary {
    fn from(dataset: &Dataset) -> Self {
        Self {
            sequences: dataset.record_count(),
            categories: dataset.summary(),
            skipped: dataset.skipped.clone(),
        }
    }
}

/// Load CSV text and return its summary as JSON.
pub fn summarize_str(
    text: &str,
    columns: &ColumnMap,
    delimiter: &str,
) -> Result<serde_json::Value, ChartError> {
    let dataset = load_str(text, columns, delimiter)?;
    serde_json::to_value(LoadSummary::from(&dataset))
        .map_err(|err| ChartError::Parse(err.to_string()))
}
