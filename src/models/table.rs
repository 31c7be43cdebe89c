use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::MetricBundle;

/// Row key of the synthesized summary row in longitudinal tables
pub const AVERAGE_ROW: &str = "average";

/// Why a row or transcript has no metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GapReason {
    /// No usable turns, or a zero denominator
    NoData(String),
    /// The query for this group returned no transcripts
    EmptyPopulation,
    /// The corpus service failed for this transcript
    FetchFailed(String),
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::NoData(detail) => write!(f, "no data: {}", detail),
            GapReason::EmptyPopulation => write!(f, "empty population"),
            GapReason::FetchFailed(detail) => write!(f, "fetch failed: {}", detail),
        }
    }
}

/// Contents of one results row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowValue {
    Metrics(MetricBundle),
    Gap(GapReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Transcript id, individual, or cross-section parameter label
    pub key: String,
    pub value: RowValue,
}

/// Results for one (analysis, group): ordered rows keyed by group key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsTable {
    pub rows: Vec<TableRow>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_metrics(&mut self, key: impl Into<String>, bundle: MetricBundle) {
        self.rows.push(TableRow {
            key: key.into(),
            value: RowValue::Metrics(bundle),
        });
    }

    pub fn push_gap(&mut self, key: impl Into<String>, reason: GapReason) {
        self.rows.push(TableRow {
            key: key.into(),
            value: RowValue::Gap(reason),
        });
    }

    pub fn get(&self, key: &str) -> Option<&RowValue> {
        self.rows.iter().find(|r| r.key == key).map(|r| &r.value)
    }

    /// Metrics of the row with `key`, if that row is not a gap
    pub fn metrics(&self, key: &str) -> Option<&MetricBundle> {
        match self.get(key)? {
            RowValue::Metrics(bundle) => Some(bundle),
            RowValue::Gap(_) => None,
        }
    }

    /// Union of metric names over every row, sorted
    pub fn columns(&self) -> Vec<String> {
        let columns: BTreeSet<&str> = self
            .rows
            .iter()
            .filter_map(|r| match &r.value {
                RowValue::Metrics(bundle) => Some(bundle.keys()),
                RowValue::Gap(_) => None,
            })
            .flatten()
            .collect();
        columns.into_iter().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
