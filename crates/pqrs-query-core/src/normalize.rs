//! Column normalization: raw source rows → canonical [`Record`]s.
//!
//! Source headers vary between the spreadsheet and delimited exports and
//! across historical files. Mapping is driven entirely by a
//! [`SynonymTable`]; headers are compared after [`fold_header`], so case,
//! accents, spacing and punctuation never matter.
//!
//! # Rules
//!
//! - The first column mapping to a canonical attribute wins; later columns
//!   mapping to the same attribute are kept in `extras`.
//! - Unmapped columns are kept in `extras` under their original header.
//! - `filed_date` is parsed by [`DateParser`]; failures leave it absent and
//!   raise [`DataQualityIssue::UnparsableDate`].
//! - When no column maps to `requester_name`, it is composed from the
//!   name-part columns (given names, then surnames).
//! - Rows without a `case_id` are excluded and raise
//!   [`DataQualityIssue::MissingCaseId`].

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::error::{EngineError, Result};
use crate::models::{CanonicalField, DataQualityIssue, RawRowSet, Record};
use crate::text::{clean_value, fold_header};

/// Components of a split requester name, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamePart {
    FirstName,
    SecondName,
    FirstSurname,
    SecondSurname,
}

impl NamePart {
    const ALL: [NamePart; 4] = [
        NamePart::FirstName,
        NamePart::SecondName,
        NamePart::FirstSurname,
        NamePart::SecondSurname,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            NamePart::FirstName => "requester_first_name",
            NamePart::SecondName => "requester_second_name",
            NamePart::FirstSurname => "requester_first_surname",
            NamePart::SecondSurname => "requester_second_surname",
        }
    }
}

/// What a source column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnTarget {
    Canonical(CanonicalField),
    NamePart(NamePart),
}

impl ColumnTarget {
    /// Parse a synonym-table key: a canonical attribute name or a
    /// `requester_*` name-part key.
    pub fn parse(key: &str) -> Result<Self> {
        let wanted = key.trim().to_ascii_lowercase();
        if let Some(part) = NamePart::ALL.iter().find(|p| p.key() == wanted) {
            return Ok(ColumnTarget::NamePart(*part));
        }
        wanted
            .parse::<CanonicalField>()
            .map(ColumnTarget::Canonical)
            .map_err(|_| {
                EngineError::validation(format!(
                    "unknown synonym key '{}': expected a canonical attribute or one of {}",
                    key,
                    NamePart::ALL
                        .iter()
                        .map(|p| p.key())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Configurable mapping from source header synonyms to column targets.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    by_folded: HashMap<String, ColumnTarget>,
}

impl SynonymTable {
    /// An empty table. Headers map only by their canonical names.
    pub fn empty() -> Self {
        let mut table = Self {
            by_folded: HashMap::new(),
        };
        for field in CanonicalField::ALL {
            table.insert(ColumnTarget::Canonical(field), field.as_str());
        }
        for part in NamePart::ALL {
            table.insert(ColumnTarget::NamePart(part), part.key());
        }
        table
    }

    /// The headers observed in historical exports, Spanish and English.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        let entries: &[(ColumnTarget, &[&str])] = &[
            (
                ColumnTarget::Canonical(CanonicalField::CaseId),
                &[
                    "numero_radicado",
                    "radicado",
                    "numero de radicado",
                    "no radicado",
                    "DOCUMENTO-CarguedeinformaciónalaplicativoPQRSDdelSIF",
                    "tracking number",
                    "case number",
                ],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::RequesterName),
                &[
                    "nombre",
                    "nombre_completo",
                    "SOLICITANTE",
                    "peticionario",
                    "nombre del peticionario",
                    "requester",
                ],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::FiledDate),
                &[
                    "fecha_radicacion",
                    "FECHA RADICACIÓN",
                    "fecha de radicacion",
                    "fecha",
                    "date filed",
                ],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::NarrativeText),
                &[
                    "texto_pqrs",
                    "ASUNTO DE LA PETICIÓN",
                    "asunto_peticion",
                    "asunto",
                    "texto",
                    "descripcion",
                    "description",
                ],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::Classification),
                &["clasificacion", "CLASE DE SOLICITUD", "clase", "categoria", "category"],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::Status),
                &["estado", "estado_pqrs", "estado de la pqrs"],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::ResponsibleUnit),
                &["unidad", "unidad responsable", "dependencia", "unit"],
            ),
            (
                ColumnTarget::Canonical(CanonicalField::Neighborhood),
                &["barrio", "BARRIO, VEREDA O SECTOR", "barrio_sector", "sector"],
            ),
            (
                ColumnTarget::NamePart(NamePart::FirstName),
                &["PRIMERNOMBRE", "primer_nombre"],
            ),
            (
                ColumnTarget::NamePart(NamePart::SecondName),
                &["SEGUNDONOMBRE", "segundo_nombre"],
            ),
            (
                ColumnTarget::NamePart(NamePart::FirstSurname),
                &["PRIMERAPELLIDO", "primer_apellido"],
            ),
            (
                ColumnTarget::NamePart(NamePart::SecondSurname),
                &["SEGUNDOAPELLIDO", "segundo_apellido"],
            ),
        ];
        for (target, synonyms) in entries {
            for synonym in *synonyms {
                table.insert(*target, synonym);
            }
        }
        table
    }

    /// Add synonyms for a key (canonical attribute or name part).
    ///
    /// A synonym already claimed by another target is reassigned, so
    /// configuration always overrides the built-in table.
    pub fn extend<S: AsRef<str>>(&mut self, key: &str, synonyms: &[S]) -> Result<()> {
        let target = ColumnTarget::parse(key)?;
        for synonym in synonyms {
            self.insert(target, synonym.as_ref());
        }
        Ok(())
    }

    fn insert(&mut self, target: ColumnTarget, synonym: &str) {
        let folded = fold_header(synonym);
        if !folded.is_empty() {
            self.by_folded.insert(folded, target);
        }
    }

    pub fn resolve(&self, header: &str) -> Option<ColumnTarget> {
        self.by_folded.get(&fold_header(header)).copied()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Default ordered list of `filed_date` formats.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y%m%d",
];

/// Largest spreadsheet serial accepted as a date (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Parses date values by trying an ordered list of `chrono` formats.
///
/// Besides the configured formats it accepts datetime text (the time part
/// is dropped) and spreadsheet serial day numbers.
#[derive(Debug, Clone)]
pub struct DateParser {
    formats: Vec<String>,
}

impl DateParser {
    pub fn new<S: AsRef<str>>(formats: &[S]) -> Result<Self> {
        if formats.is_empty() {
            return Err(EngineError::validation("at least one date format is required"));
        }
        Ok(Self {
            formats: formats.iter().map(|f| f.as_ref().to_string()).collect(),
        })
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        self.parse_text(value)
            .or_else(|| parse_serial(value.trim()))
    }

    /// Like [`parse`](Self::parse) but without the serial-number fallback,
    /// for text typed by a person rather than read from a cell.
    pub fn parse_text(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Some(d) = self.parse_with_formats(value) {
            return Some(d);
        }
        let (date_part, _time) = value.split_once(|c: char| c == ' ' || c == 'T')?;
        self.parse_with_formats(date_part)
    }

    fn parse_with_formats(&self, value: &str) -> Option<NaiveDate> {
        self.formats
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
    }
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Spreadsheet serial day number (days since 1899-12-30, fraction = time).
fn parse_serial(value: &str) -> Option<NaiveDate> {
    if !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let serial: f64 = value.parse().ok()?;
    if !(1.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Output of [`normalize_rows`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub issues: Vec<DataQualityIssue>,
}

/// Map a raw row set onto canonical records.
pub fn normalize_rows(raw: &RawRowSet, synonyms: &SynonymTable, dates: &DateParser) -> Normalized {
    let plan = ColumnPlan::new(&raw.headers, synonyms);
    let mut out = Normalized {
        records: Vec::with_capacity(raw.rows.len()),
        issues: Vec::new(),
    };

    for (idx, row) in raw.rows.iter().enumerate() {
        let row_no = idx + 1;
        let mut record = Record::new(String::new());
        let mut case_id: Option<String> = None;
        let mut raw_date: Option<String> = None;
        let mut parts: Vec<(NamePart, String)> = Vec::new();

        for (col, cell) in row.iter().enumerate() {
            let Some(value) = clean_value(cell) else {
                continue;
            };
            match plan.targets.get(col).copied().flatten() {
                Some(ColumnTarget::Canonical(field)) => match field {
                    CanonicalField::CaseId => case_id = Some(value),
                    CanonicalField::FiledDate => raw_date = Some(value),
                    CanonicalField::RequesterName => record.requester_name = Some(value),
                    CanonicalField::NarrativeText => record.narrative_text = Some(value),
                    CanonicalField::Classification => record.classification = Some(value),
                    CanonicalField::Status => record.status = Some(value),
                    CanonicalField::ResponsibleUnit => record.responsible_unit = Some(value),
                    CanonicalField::Neighborhood => record.neighborhood = Some(value),
                },
                Some(ColumnTarget::NamePart(part)) => {
                    record.extras.insert(plan.header_name(col), value.clone());
                    parts.push((part, value));
                }
                None => {
                    record.extras.insert(plan.header_name(col), value);
                }
            }
        }

        let Some(case_id) = case_id else {
            log::debug!("row {}: no case id, excluded", row_no);
            out.issues.push(DataQualityIssue::MissingCaseId { row: row_no });
            continue;
        };
        record.case_id = case_id;

        if let Some(value) = raw_date {
            record.filed_date = dates.parse(&value);
            if record.filed_date.is_none() {
                log::debug!("row {}: unparsable date '{}'", row_no, value);
                out.issues.push(DataQualityIssue::UnparsableDate {
                    row: row_no,
                    case_id: record.case_id.clone(),
                    value,
                });
            }
        }

        if record.requester_name.is_none() && !parts.is_empty() {
            parts.sort_by_key(|(part, _)| *part);
            let composed = parts
                .iter()
                .map(|(_, v)| v.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            record.requester_name = clean_value(&composed);
        }

        out.records.push(record);
    }

    out
}

/// Per-column targets for one header row.
struct ColumnPlan<'a> {
    headers: &'a [String],
    targets: Vec<Option<ColumnTarget>>,
}

impl<'a> ColumnPlan<'a> {
    fn new(headers: &'a [String], synonyms: &SynonymTable) -> Self {
        let mut claimed: Vec<ColumnTarget> = Vec::new();
        let targets = headers
            .iter()
            .map(|h| match synonyms.resolve(h) {
                Some(t) if !claimed.contains(&t) => {
                    claimed.push(t);
                    Some(t)
                }
                Some(t) => {
                    log::debug!("column '{}' duplicates mapping {:?}, kept as extra", h, t);
                    None
                }
                None => None,
            })
            .collect();
        Self { headers, targets }
    }

    fn header_name(&self, col: usize) -> String {
        match self.headers.get(col).map(|h| h.trim()) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => format!("column_{}", col + 1),
        }
    }
}
