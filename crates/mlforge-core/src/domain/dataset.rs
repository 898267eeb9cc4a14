//! Dataset domain types.
//!
//! A `Dataset` is a logical, named data source. Each upload produces an
//! immutable `DatasetVersion` whose backing URI never changes once set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Owner;

// ─────────────────────────────────────────────────────────────────────────────
// Data Type
// ─────────────────────────────────────────────────────────────────────────────

/// Declared format of a dataset's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Csv,
    Tsv,
}

impl DataType {
    /// Column separator implied by the data type.
    pub const fn column_separator(self) -> char {
        match self {
            Self::Csv => ',',
            Self::Tsv => '\t',
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CSV" => Ok(Self::Csv),
            "TSV" => Ok(Self::Tsv),
            other => Err(format!("unknown data type '{other}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dataset
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted dataset.
///
/// Only `comments` may change once versions exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub owner: Owner,
    pub data_type: DataType,
    /// Where the data came from (e.g. "file", "hdfs").
    pub source_type: String,
    /// Where uploaded versions are kept.
    pub target_type: String,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A dataset to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataset {
    pub name: String,
    pub owner: Owner,
    pub data_type: DataType,
    pub source_type: String,
    pub target_type: String,
    pub comments: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dataset Version
// ─────────────────────────────────────────────────────────────────────────────

/// Small cached preview of a dataset version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePoints {
    /// Header name to zero-based column index.
    pub header_map: BTreeMap<String, usize>,
    /// Raw tokens of the sampled rows.
    pub rows: Vec<Vec<String>>,
}

impl SamplePoints {
    /// Build a sample from a header line and raw data lines.
    pub fn from_lines<'a>(
        header: &str,
        lines: impl IntoIterator<Item = &'a str>,
        separator: char,
        limit: usize,
    ) -> Self {
        let header_map = header
            .split(separator)
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();

        let rows = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .take(limit)
            .map(|line| line.split(separator).map(|t| t.trim().to_string()).collect())
            .collect();

        Self { header_map, rows }
    }

    /// Column names ordered by index.
    pub fn header(&self) -> Vec<&str> {
        let mut columns: Vec<(&str, usize)> = self
            .header_map
            .iter()
            .map(|(name, idx)| (name.as_str(), *idx))
            .collect();
        columns.sort_by_key(|(_, idx)| *idx);
        columns.into_iter().map(|(name, _)| name).collect()
    }
}

/// An immutable snapshot of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: i64,
    pub dataset_id: i64,
    /// Version label, unique per dataset and owner.
    pub version: String,
    /// Backing URI (`file://...`, `hdfs://host:port/...` or a bare path).
    pub uri: String,
    /// Optional cached sample, attached at most once.
    pub sample: Option<SamplePoints>,
    pub created_at: DateTime<Utc>,
}

/// A dataset version to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDatasetVersion {
    pub dataset_id: i64,
    pub version: String,
    pub uri: String,
}
