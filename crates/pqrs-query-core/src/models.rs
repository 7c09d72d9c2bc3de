//! Core data models used throughout PQRS Query.
//!
//! These types represent the raw rows produced by a source reader, the
//! normalized records kept in the store, and the data-quality issues found
//! on the way from one to the other.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Which of the two interchangeable sources a row set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Spreadsheet,
    Delimited,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Spreadsheet => write!(f, "spreadsheet"),
            SourceKind::Delimited => write!(f, "delimited"),
        }
    }
}

/// Where a raw row set was read from.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    pub source_kind: SourceKind,
    pub path: PathBuf,
    pub row_count: usize,
    /// Hex SHA-256 of the source bytes.
    pub fingerprint: String,
}

/// Raw item produced by a source reader before normalization.
///
/// `rows[i][j]` is the raw value of column `headers[j]`; rows are padded
/// to the header width by the readers.
#[derive(Debug, Clone)]
pub struct RawRowSet {
    pub provenance: Provenance,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawRowSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One normalized historical PQRS entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub case_id: String,
    pub requester_name: Option<String>,
    pub filed_date: Option<NaiveDate>,
    pub narrative_text: Option<String>,
    pub classification: Option<String>,
    pub status: Option<String>,
    pub responsible_unit: Option<String>,
    pub neighborhood: Option<String>,
    /// Source columns with no canonical mapping, keyed by original header.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl Record {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            requester_name: None,
            filed_date: None,
            narrative_text: None,
            classification: None,
            status: None,
            responsible_unit: None,
            neighborhood: None,
            extras: BTreeMap::new(),
        }
    }

    /// Text value of a canonical attribute. `filed_date` is rendered as
    /// `YYYY-MM-DD`.
    pub fn text(&self, field: CanonicalField) -> Option<String> {
        match field {
            CanonicalField::FiledDate => self.filed_date.map(|d| d.format("%Y-%m-%d").to_string()),
            _ => self.text_ref(field).map(str::to_string),
        }
    }

    /// Borrowed value of a textual canonical attribute; `None` for
    /// `filed_date`.
    pub fn text_ref(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::CaseId => Some(self.case_id.as_str()),
            CanonicalField::RequesterName => self.requester_name.as_deref(),
            CanonicalField::FiledDate => None,
            CanonicalField::NarrativeText => self.narrative_text.as_deref(),
            CanonicalField::Classification => self.classification.as_deref(),
            CanonicalField::Status => self.status.as_deref(),
            CanonicalField::ResponsibleUnit => self.responsible_unit.as_deref(),
            CanonicalField::Neighborhood => self.neighborhood.as_deref(),
        }
    }
}

/// The fixed set of normalized attribute names all sources map into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    CaseId,
    RequesterName,
    FiledDate,
    NarrativeText,
    Classification,
    Status,
    ResponsibleUnit,
    Neighborhood,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::CaseId,
        CanonicalField::RequesterName,
        CanonicalField::FiledDate,
        CanonicalField::NarrativeText,
        CanonicalField::Classification,
        CanonicalField::Status,
        CanonicalField::ResponsibleUnit,
        CanonicalField::Neighborhood,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::CaseId => "case_id",
            CanonicalField::RequesterName => "requester_name",
            CanonicalField::FiledDate => "filed_date",
            CanonicalField::NarrativeText => "narrative_text",
            CanonicalField::Classification => "classification",
            CanonicalField::Status => "status",
            CanonicalField::ResponsibleUnit => "responsible_unit",
            CanonicalField::Neighborhood => "neighborhood",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                EngineError::validation(format!(
                    "unknown attribute '{}'; expected one of: {}",
                    s,
                    CanonicalField::ALL
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// A data-quality problem found while normalizing or building the store.
///
/// Issues never abort a load; they are surfaced as warnings next to it.
/// Row numbers are 1-based positions among the data rows (the header is
/// not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    MissingCaseId {
        row: usize,
    },
    UnparsableDate {
        row: usize,
        case_id: String,
        value: String,
    },
    DuplicateCaseId {
        case_id: String,
        occurrences: usize,
    },
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityIssue::MissingCaseId { row } => {
                write!(f, "row {}: missing case id, row excluded", row)
            }
            DataQualityIssue::UnparsableDate {
                row,
                case_id,
                value,
            } => write!(
                f,
                "row {} ({}): unparsable filed date '{}', left absent",
                row, case_id, value
            ),
            DataQualityIssue::DuplicateCaseId {
                case_id,
                occurrences,
            } => write!(
                f,
                "case id {} appears {} times, last occurrence kept",
                case_id, occurrences
            ),
        }
    }
}
