//! Row parsing and category grouping.

use std::collections::{hash_map::Entry, HashMap};

use crate::{
    CategoryDomain, ChartError, Dataset, Extent, RawRow, SequenceRecord, SkippedRow, StateEntry,
};

/// Split one row's list columns and pair them into a [`SequenceRecord`].
///
/// `row` is only used to label errors.
pub fn parse_row(row: usize, raw: &RawRow, delimiter: &str) -> Result<SequenceRecord, ChartError> {
    let states = split_list(&raw.states, delimiter);
    let starts = split_list(&raw.starts, delimiter);
    let durations = split_list(&raw.durations, delimiter);

    if states.len() != starts.len() || states.len() != durations.len() {
        return Err(ChartError::MalformedRow {
            row,
            states: states.len(),
            starts: starts.len(),
            durations: durations.len(),
        });
    }
    if states.is_empty() {
        return Err(ChartError::EmptySequence { row });
    }

    let mut entries = Vec::with_capacity(states.len());
    for ((state, start), duration) in states.into_iter().zip(starts).zip(durations) {
        entries.push(StateEntry {
            state: state.to_string(),
            start: parse_number(row, "starts", start)?,
            duration: parse_number(row, "durations", duration)?,
        });
    }

    Ok(SequenceRecord {
        category: raw.category.clone(),
        sequence_id: raw.sequence_id.clone(),
        states: entries,
    })
}

fn split_list<'a>(value: &'a str, delimiter: &str) -> Vec<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if delimiter.is_empty() {
        return vec![trimmed];
    }
    trimmed.split(delimiter).map(str::trim).collect()
}

fn parse_number(row: usize, column: &str, value: &str) -> Result<f64, ChartError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ChartError::InvalidNumber {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Accumulates rows into a [`Dataset`], widening domains as it goes.
///
/// Row-level failures are recorded and skipped; they never abort the load.
#[derive(Debug)]
pub struct DatasetBuilder {
    delimiter: String,
    categories: Vec<String>,
    records: HashMap<String, Vec<SequenceRecord>>,
    domains: HashMap<String, CategoryDomain>,
    sequence_ids: HashMap<String, Vec<String>>,
    skipped: Vec<SkippedRow>,
    rows_seen: usize,
}

impl DatasetBuilder {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            categories: Vec::new(),
            records: HashMap::new(),
            domains: HashMap::new(),
            sequence_ids: HashMap::new(),
            skipped: Vec::new(),
            rows_seen: 0,
        }
    }

    /// Parse and ingest the next row. Returns the error when the row was skipped.
    pub fn push_row(&mut self, raw: &RawRow) -> Result<(), ChartError> {
        let row = self.rows_seen;
        self.rows_seen += 1;

        match parse_row(row, raw, &self.delimiter) {
            Ok(record) => {
                self.push_record(record);
                Ok(())
            }
            Err(err) => {
                log::warn!("skipping {err}");
                self.skipped.push(SkippedRow {
                    row,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Ingest an already parsed record.
    pub fn push_record(&mut self, record: SequenceRecord) {
        let Some(first) = record.states.first() else {
            return;
        };
        let category = record.category.clone();

        let domain = match self.domains.entry(category.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                log::debug!("new category `{category}`");
                self.categories.push(category.clone());
                slot.insert(CategoryDomain {
                    x: Extent::new(0.0, 0.0),
                    y: Extent::new(first.start.min(first.end()), first.start.max(first.end())),
                })
            }
        };
        domain.x.max += 1.0;
        for entry in &record.states {
            domain.y.cover(entry.start, entry.end());
        }

        let ids = self.sequence_ids.entry(category.clone()).or_default();
        if ids.contains(&record.sequence_id) {
            log::debug!(
                "duplicate sequence id `{}` in category `{category}`",
                record.sequence_id
            );
        } else {
            ids.push(record.sequence_id.clone());
        }

        self.records.entry(category).or_default().push(record);
    }

    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    pub fn finish(self) -> Dataset {
        log::debug!(
            "ingested {} rows into {} categories ({} skipped)",
            self.rows_seen,
            self.categories.len(),
            self.skipped.len()
        );
        Dataset {
            categories: self.categories,
            records_by_category: self.records,
            domains: self.domains,
            sequence_ids: self.sequence_ids,
            skipped: self.skipped,
        }
    }
}

/// Convenience wrapper over [`DatasetBuilder`] for in-memory rows.
pub fn build_dataset<'a>(rows: impl IntoIterator<Item = &'a RawRow>, delimiter: &str) -> Dataset {
    let mut builder = DatasetBuilder::new(delimiter);
    for raw in rows {
        let _ = builder.push_row(raw);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(states: &str, starts: &str, durations: &str, category: &str, id: &str) -> RawRow {
        RawRow {
            states: states.to_string(),
            starts: starts.to_string(),
            durations: durations.to_string(),
            category: category.to_string(),
            sequence_id: id.to_string(),
        }
    }

    #[test]
    fn two_rows_share_one_category() {
        let rows = [row("A-B", "0-5", "5-3", "X", "1"), row("A", "0", "2", "X", "2")];
        let dataset = build_dataset(&rows, "-");

        assert_eq!(dataset.categories, vec!["X".to_string()]);
        let domain = dataset.domain("X").expect("domain for X");
        assert_eq!(domain.x, Extent::new(0.0, 2.0));
        assert_eq!(domain.y, Extent::new(0.0, 8.0));

        let records = dataset.records("X");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].states.len(), 2);
        assert_eq!(records[0].states[1].state, "B");
        assert_eq!(records[0].states[1].start, 5.0);
        assert_eq!(records[0].states[1].duration, 3.0);
        assert_eq!(records[1].sequence_id, "2");
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let rows = [
            row("A", "0", "1", "beta", "1"),
            row("A", "0", "1", "alpha", "1"),
            row("A", "0", "1", "beta", "2"),
        ];
        let dataset = build_dataset(&rows, "-");
        assert_eq!(dataset.categories, vec!["beta", "alpha"]);
        assert_eq!(dataset.domain("beta").map(|d| d.x.max), Some(2.0));
        assert_eq!(dataset.domain("alpha").map(|d| d.x.max), Some(1.0));
    }

    #[test]
    fn domain_starts_from_first_entry_and_widens() {
        let rows = [row("A", "10", "5", "X", "1"), row("A-B", "4-30", "1-2", "X", "2")];
        let dataset = build_dataset(&rows, "-");
        let domain = dataset.domain("X").expect("domain");
        assert_eq!(domain.y, Extent::new(4.0, 32.0));
    }

    #[test]
    fn mismatched_lengths_skip_row_only() {
        let rows = [row("A-B", "0", "1-1", "X", "1"), row("A", "0", "2", "X", "2")];
        let dataset = build_dataset(&rows, "-");
        assert_eq!(dataset.records("X").len(), 1);
        assert_eq!(dataset.skipped.len(), 1);
        assert_eq!(dataset.skipped[0].row, 0);
        assert_eq!(dataset.domain("X").map(|d| d.x.max), Some(1.0));
    }

    #[test]
    fn parse_row_reports_lengths() {
        let err = parse_row(3, &row("A-B-C", "0-1", "1-1-1", "X", "1"), "-").unwrap_err();
        assert_eq!(
            err,
            ChartError::MalformedRow {
                row: 3,
                states: 3,
                starts: 2,
                durations: 3
            }
        );
        assert!(err.is_row_error());
    }

    #[test]
    fn non_numeric_start_is_rejected() {
        let err = parse_row(0, &row("A", "soon", "1", "X", "1"), "-").unwrap_err();
        assert!(matches!(err, ChartError::InvalidNumber { ref column, .. } if column == "starts"));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = parse_row(7, &row("", "", "", "X", "1"), "-").unwrap_err();
        assert_eq!(err, ChartError::EmptySequence { row: 7 });
    }

    #[test]
    fn custom_delimiter_and_whitespace() {
        let record = parse_row(0, &row("on | off", " 0|2.5 ", "2.5|1", "X", "1"), "|")
            .expect("row parses");
        assert_eq!(record.states[1].state, "off");
        assert_eq!(record.states[1].start, 2.5);
    }

    #[test]
    fn duplicate_ids_are_listed_once() {
        let rows = [row("A", "0", "1", "X", "7"), row("B", "0", "1", "X", "7")];
        let dataset = build_dataset(&rows, "-");
        assert_eq!(dataset.sequence_ids("X"), ["7".to_string()]);
        assert_eq!(dataset.records("X").len(), 2);
    }

    #[test]
    fn domains_bound_every_state() {
        let rows = [
            row("A-B-C", "3-9-20", "6-11-4", "X", "1"),
            row("A-B", "1-2", "1-40", "X", "2"),
            row("C", "15", "0", "X", "3"),
        ];
        let dataset = build_dataset(&rows, "-");
        let domain = dataset.domain("X").expect("domain");
        for record in dataset.records("X") {
            for entry in &record.states {
                assert!(domain.y.min <= entry.start);
                assert!(domain.y.max >= entry.end());
            }
        }
        assert_eq!(domain.x.max as usize, dataset.records("X").len());
    }

    #[test]
    fn negative_duration_keeps_domain_ordered() {
        let rows = [row("A|B", "10|2", "-4|1", "X", "1")];
        let dataset = build_dataset(&rows, "|");
        let domain = dataset.domain("X").expect("domain");
        assert_eq!(domain.y, Extent::new(2.0, 10.0));
        assert!(domain.y.min <= domain.y.max);
    }
}
