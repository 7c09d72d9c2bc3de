//! Retrieval strategies over one [`RecordStore`] generation.
//!
//! Every strategy is a read-only scan (or index probe) of the store it is
//! handed and returns a [`SearchHits`]: the records kept after the limit
//! plus how many matched in total.
//!
//! # Ranking
//!
//! Free-text and name search score a record by how many distinct query
//! tokens occur in it (folded substring match). Results are ordered by:
//!
//! 1. score (desc)
//! 2. `filed_date` (desc, undated last)
//! 3. load order (asc)
//!
//! Date-range and filter results have no score and use a [`SortSpec`],
//! defaulting to `filed_date` descending. Records missing the sort
//! attribute always sort last; ties fall back to load order.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{CanonicalField, Record};
use crate::store::RecordStore;
use crate::text::{fold, fold_header, tokenize};

/// Words dropped from free-text and name queries.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "de", "del", "la", "las", "el", "los", "en", "un", "una", "por", "para", "con", "que", "se",
    "al", "lo", "y", "o", "a", "hay", "sobre", "pqrs", "the", "of", "and", "in", "on", "for",
    "to", "with", "about",
];

/// Extra (unmapped) columns whose text free-text search also scans:
/// intake notes, follow-up log and observations.
pub const DEFAULT_TEXT_EXTRA_COLUMNS: &[&str] = &[
    "DATOS INICIALES PQRSD",
    "datos_iniciales",
    "SEGUIMIENTO DE LA PQRSD",
    "seguimiento",
    "OBSERVACIÓN",
    "observacion",
];

/// Retrieval tuning, decoupled from application config.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Limit applied when the caller passes none.
    pub default_limit: usize,
    /// Upper bound on any requested limit.
    pub max_limit: usize,
    /// Also match free-text tokens against `status` and `classification`.
    pub search_categories: bool,
    /// Folded stopwords.
    pub stopwords: Vec<String>,
    /// Headers (folded with [`fold_header`]) of extra columns that free
    /// text also matches.
    pub text_columns: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
            search_categories: true,
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| fold(w)).collect(),
            text_columns: DEFAULT_TEXT_EXTRA_COLUMNS.iter().map(|h| fold_header(h)).collect(),
        }
    }
}

impl SearchParams {
    /// Effective limit: the default when absent, clamped to `max_limit`.
    pub fn resolve_limit(&self, limit: Option<usize>) -> Result<usize> {
        match limit {
            None => Ok(self.default_limit.min(self.max_limit)),
            Some(0) => Err(EngineError::validation("limit must be at least 1")),
            Some(n) if n > self.max_limit => {
                log::debug!("limit {} clamped to {}", n, self.max_limit);
                Ok(self.max_limit)
            }
            Some(n) => Ok(n),
        }
    }
}

/// Result of one retrieval strategy.
#[derive(Debug, Clone)]
pub struct SearchHits<'a> {
    pub records: Vec<&'a Record>,
    /// Matches before the limit was applied.
    pub matched_count: usize,
}

impl<'a> SearchHits<'a> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            matched_count: 0,
        }
    }

    fn from_positions(records: &'a [Record], positions: Vec<usize>, limit: usize) -> Self {
        let matched_count = positions.len();
        Self {
            records: positions
                .into_iter()
                .take(limit)
                .map(|idx| &records[idx])
                .collect(),
            matched_count,
        }
    }
}

/// Folded copy of a record's searchable attributes, built once per
/// generation by the store.
#[derive(Debug, Clone)]
pub(crate) struct FoldedText {
    case_id: String,
    requester_name: Option<String>,
    narrative_text: Option<String>,
    classification: Option<String>,
    status: Option<String>,
    responsible_unit: Option<String>,
    neighborhood: Option<String>,
    /// `(fold_header(header), fold(value))` for every extra column.
    extras: Vec<(String, String)>,
}

impl FoldedText {
    pub(crate) fn of(r: &Record) -> Self {
        let f = |v: &Option<String>| v.as_deref().map(fold);
        Self {
            case_id: fold(&r.case_id),
            requester_name: f(&r.requester_name),
            narrative_text: f(&r.narrative_text),
            classification: f(&r.classification),
            status: f(&r.status),
            responsible_unit: f(&r.responsible_unit),
            neighborhood: f(&r.neighborhood),
            extras: r
                .extras
                .iter()
                .map(|(header, value)| (fold_header(header), fold(value)))
                .collect(),
        }
    }

    fn field(&self, field: CanonicalField) -> Option<&str> {
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

    fn contains(&self, field: CanonicalField, needle: &str) -> bool {
        self.field(field).is_some_and(|h| h.contains(needle))
    }

    fn text_contains(&self, needle: &str, params: &SearchParams) -> bool {
        self.contains(CanonicalField::NarrativeText, needle)
            || (params.search_categories
                && (self.contains(CanonicalField::Status, needle)
                    || self.contains(CanonicalField::Classification, needle)))
            || self.extras.iter().any(|(header, value)| {
                value.contains(needle) && params.text_columns.iter().any(|c| c == header)
            })
    }
}

// ============ Exact lookup ============

/// Record whose `case_id` equals `case_id` (trimmed, case-insensitive).
pub fn lookup<'a>(store: &'a RecordStore, case_id: &str) -> Option<&'a Record> {
    store.get(case_id)
}

// ============ Free text and name ============

/// Records whose narrative, configured extra text columns and (if enabled)
/// status/classification contain any of the query's tokens, ranked by how
/// many they contain.
pub fn search_text<'a>(
    store: &'a RecordStore,
    text: &str,
    limit: Option<usize>,
    params: &SearchParams,
) -> Result<SearchHits<'a>> {
    let limit = params.resolve_limit(limit)?;
    let tokens = tokenize(text, &params.stopwords);
    Ok(ranked(store, &tokens, limit, |f, t| f.text_contains(t, params)))
}

/// Records whose `requester_name` contains any token of `fragment`.
pub fn search_name<'a>(
    store: &'a RecordStore,
    fragment: &str,
    limit: Option<usize>,
    params: &SearchParams,
) -> Result<SearchHits<'a>> {
    let limit = params.resolve_limit(limit)?;
    let tokens = criterion_tokens(fragment, &params.stopwords);
    Ok(ranked(store, &tokens, limit, |f, t| {
        f.contains(CanonicalField::RequesterName, t)
    }))
}

fn ranked<'a, F>(store: &'a RecordStore, tokens: &[String], limit: usize, hit: F) -> SearchHits<'a>
where
    F: Fn(&FoldedText, &str) -> bool,
{
    if tokens.is_empty() {
        return SearchHits::empty();
    }

    let mut scored: Vec<(usize, usize)> = store
        .folded()
        .iter()
        .enumerate()
        .filter_map(|(idx, f)| {
            let score = tokens.iter().filter(|t| hit(f, t.as_str())).count();
            (score > 0).then_some((idx, score))
        })
        .collect();

    let records = store.records();
    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| present_first(records[a.0].filed_date, records[b.0].filed_date, SortOrder::Desc))
            .then(a.0.cmp(&b.0))
    });

    SearchHits::from_positions(records, scored.into_iter().map(|(idx, _)| idx).collect(), limit)
}

// ============ Date range ============

/// Records filed between `start` and `end`, both inclusive, newest first.
/// Undated records never match.
pub fn search_date_range<'a>(
    store: &'a RecordStore,
    start: NaiveDate,
    end: NaiveDate,
    limit: Option<usize>,
    params: &SearchParams,
) -> Result<SearchHits<'a>> {
    if start > end {
        return Err(EngineError::validation(format!(
            "date range start {} is after end {}",
            start, end
        )));
    }
    let limit = params.resolve_limit(limit)?;

    let mut positions: Vec<usize> = store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.filed_date.is_some_and(|d| start <= d && d <= end))
        .map(|(idx, _)| idx)
        .collect();
    sort_positions(store, &mut positions, SortSpec::default());

    Ok(SearchHits::from_positions(store.records(), positions, limit))
}

// ============ Combined filter ============

/// Conjunctive filter criteria. Absent or blank criteria are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Every token must occur in the narrative, an extra text column or (if
    /// enabled) a category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Exact, case-insensitive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    /// Every token must occur in the requester name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.text)
            && blank(&self.case_id)
            && blank(&self.requester_name)
            && self.filed_from.is_none()
            && self.filed_to.is_none()
            && blank(&self.classification)
            && blank(&self.status)
            && blank(&self.responsible_unit)
            && blank(&self.neighborhood)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(EngineError::validation(format!(
                "unknown sort order '{}'; expected asc or desc",
                other
            ))),
        }
    }
}

/// Attribute and direction used to order unscored results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: CanonicalField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: CanonicalField::FiledDate,
            order: SortOrder::Desc,
        }
    }
}

/// Records satisfying every criterion, ordered by `sort`.
pub fn filter<'a>(
    store: &'a RecordStore,
    criteria: &FilterCriteria,
    sort: Option<SortSpec>,
    limit: Option<usize>,
    params: &SearchParams,
) -> Result<SearchHits<'a>> {
    filter_with_matches(store, criteria, sort, limit, params).map(|(hits, _)| hits)
}

/// [`filter`], also returning every match (sorted, before the limit) from
/// the same scan.
pub fn filter_with_matches<'a>(
    store: &'a RecordStore,
    criteria: &FilterCriteria,
    sort: Option<SortSpec>,
    limit: Option<usize>,
    params: &SearchParams,
) -> Result<(SearchHits<'a>, Vec<&'a Record>)> {
    let limit = params.resolve_limit(limit)?;
    let mut positions = matching_positions(store, criteria, params)?;
    sort_positions(store, &mut positions, sort.unwrap_or_default());

    let records = store.records();
    let all: Vec<&Record> = positions.iter().map(|&idx| &records[idx]).collect();
    let hits = SearchHits {
        records: all.iter().take(limit).copied().collect(),
        matched_count: all.len(),
    };
    Ok((hits, all))
}

/// Every record satisfying `criteria`, in load order, without a limit.
pub fn matching<'a>(
    store: &'a RecordStore,
    criteria: &FilterCriteria,
    params: &SearchParams,
) -> Result<Vec<&'a Record>> {
    let records = store.records();
    Ok(matching_positions(store, criteria, params)?
        .into_iter()
        .map(|idx| &records[idx])
        .collect())
}

fn matching_positions(
    store: &RecordStore,
    criteria: &FilterCriteria,
    params: &SearchParams,
) -> Result<Vec<usize>> {
    let compiled = CompiledFilter::compile(criteria, params)?;
    let records = store.records();
    let folded = store.folded();

    if let Some(case_id) = criteria.case_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(store
            .position(case_id)
            .filter(|&idx| compiled.matches(&records[idx], &folded[idx]))
            .into_iter()
            .collect());
    }

    Ok((0..records.len())
        .filter(|&idx| compiled.matches(&records[idx], &folded[idx]))
        .collect())
}

/// Criteria folded and tokenized once per call.
struct CompiledFilter<'p> {
    text: Vec<String>,
    name: Vec<String>,
    categorical: Vec<(CanonicalField, String)>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    params: &'p SearchParams,
}

impl<'p> CompiledFilter<'p> {
    fn compile(c: &FilterCriteria, params: &'p SearchParams) -> Result<Self> {
        if let (Some(from), Some(to)) = (c.filed_from, c.filed_to) {
            if from > to {
                return Err(EngineError::validation(format!(
                    "filed_from {} is after filed_to {}",
                    from, to
                )));
            }
        }

        let tokens = |v: &Option<String>| {
            v.as_deref()
                .map(|s| criterion_tokens(s, &params.stopwords))
                .unwrap_or_default()
        };

        let categorical = [
            (CanonicalField::Classification, &c.classification),
            (CanonicalField::Status, &c.status),
            (CanonicalField::ResponsibleUnit, &c.responsible_unit),
            (CanonicalField::Neighborhood, &c.neighborhood),
        ]
        .into_iter()
        .filter_map(|(field, v)| {
            let folded = fold(v.as_deref()?.trim());
            (!folded.is_empty()).then_some((field, folded))
        })
        .collect();

        Ok(Self {
            text: tokens(&c.text),
            name: tokens(&c.requester_name),
            categorical,
            from: c.filed_from,
            to: c.filed_to,
            params,
        })
    }

    fn matches(&self, r: &Record, f: &FoldedText) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let Some(d) = r.filed_date else {
                return false;
            };
            if self.from.is_some_and(|from| d < from) || self.to.is_some_and(|to| d > to) {
                return false;
            }
        }
        self.text
            .iter()
            .all(|t| f.text_contains(t, self.params))
            && self
                .name
                .iter()
                .all(|t| f.contains(CanonicalField::RequesterName, t))
            && self
                .categorical
                .iter()
                .all(|(field, needle)| f.contains(*field, needle))
    }
}

/// Tokens for a criterion value. Falls back to keeping stopwords, then to
/// the whole folded value, so a non-blank criterion never vanishes.
fn criterion_tokens(value: &str, stopwords: &[String]) -> Vec<String> {
    let tokens = tokenize(value, stopwords);
    if !tokens.is_empty() {
        return tokens;
    }
    let tokens = tokenize(value, &[]);
    if !tokens.is_empty() {
        return tokens;
    }
    let whole = fold(value.trim());
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole]
    }
}

// ============ Ordering ============

fn sort_positions(store: &RecordStore, positions: &mut [usize], spec: SortSpec) {
    let records = store.records();
    let folded = store.folded();
    positions.sort_by(|&a, &b| {
        let ord = match spec.field {
            CanonicalField::FiledDate => {
                present_first(records[a].filed_date, records[b].filed_date, spec.order)
            }
            field => present_first(folded[a].field(field), folded[b].field(field), spec.order),
        };
        ord.then(a.cmp(&b))
    });
}

/// Compare two optional keys in `order`, with absent keys after present ones.
fn present_first<T: Ord>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => x.cmp(&y),
            SortOrder::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{date, sample_store};

    fn ids(hits: &SearchHits<'_>) -> Vec<String> {
        hits.records.iter().map(|r| r.case_id.clone()).collect()
    }

    #[test]
    fn lookup_finds_exact_id_only() {
        let store = sample_store();
        assert_eq!(lookup(&store, "2024-00452").unwrap().requester_name.as_deref(), Some("Carlos Pérez"));
        assert!(lookup(&store, "2024-0045").is_none());
    }

    #[test]
    fn free_text_ranks_by_token_hits_then_date() {
        let store = sample_store();
        let hits = search_text(&store, "vía huecos", None, &SearchParams::default()).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00451", "2024-00453", "2024-00460"]);
        assert_eq!(hits.matched_count, 3);
    }

    #[test]
    fn free_text_can_match_categories() {
        let store = sample_store();
        let params = SearchParams::default();
        let hits = search_text(&store, "reclamo", None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2023-00990"]);

        let no_categories = SearchParams {
            search_categories: false,
            ..SearchParams::default()
        };
        let hits = search_text(&store, "pendiente", None, &no_categories).unwrap();
        assert_eq!(hits.matched_count, 0);
    }

    #[test]
    fn free_text_scans_configured_extra_columns() {
        let mut a = Record::new("A-1");
        a.narrative_text = Some("Solicitud general".into());
        a.extras.insert("SEGUIMIENTO DE LA PQRSD".into(), "Se programó la poda".into());
        let mut b = Record::new("A-2");
        b.extras.insert("Observación".into(), "Remitido a alcantarillado".into());
        let mut c = Record::new("A-3");
        c.extras.insert("CELULAR 1".into(), "poda alcantarillado".into());
        let store = RecordStore::build(1, vec![a, b, c], None);
        let params = SearchParams::default();

        let hits = search_text(&store, "poda", None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["A-1"]);
        let hits = search_text(&store, "alcantarillado", None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["A-2"]);

        let criteria = FilterCriteria {
            text: Some("poda".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(matching(&store, &criteria, &params).unwrap().len(), 1);

        let narrative_only = SearchParams {
            text_columns: Vec::new(),
            ..SearchParams::default()
        };
        let hits = search_text(&store, "poda", None, &narrative_only).unwrap();
        assert_eq!(hits.matched_count, 0);
    }

    #[test]
    fn filter_with_matches_returns_page_and_full_set() {
        let store = sample_store();
        let criteria = FilterCriteria {
            classification: Some("queja".into()),
            ..FilterCriteria::default()
        };
        let (hits, all) =
            filter_with_matches(&store, &criteria, None, Some(1), &SearchParams::default()).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00453"]);
        assert_eq!(hits.matched_count, 2);
        let all: Vec<&str> = all.iter().map(|r| r.case_id.as_str()).collect();
        assert_eq!(all, vec!["2024-00453", "2024-00451"]);
    }

    #[test]
    fn free_text_of_only_stopwords_is_empty() {
        let store = sample_store();
        let hits = search_text(&store, "de la", None, &SearchParams::default()).unwrap();
        assert!(hits.records.is_empty());
        assert_eq!(hits.matched_count, 0);
    }

    #[test]
    fn limit_truncates_but_reports_total() {
        let store = sample_store();
        let hits = search_text(&store, "via", Some(1), &SearchParams::default()).unwrap();
        assert_eq!(hits.records.len(), 1);
        assert_eq!(hits.matched_count, 3);
    }

    #[test]
    fn zero_limit_is_rejected_and_large_limit_clamped() {
        let params = SearchParams {
            max_limit: 2,
            ..SearchParams::default()
        };
        assert!(params.resolve_limit(Some(0)).is_err());
        assert_eq!(params.resolve_limit(Some(50)).unwrap(), 2);
        assert_eq!(params.resolve_limit(None).unwrap(), 2);
    }

    #[test]
    fn name_search_is_partial_and_accent_insensitive() {
        let store = sample_store();
        let params = SearchParams::default();
        let hits = search_name(&store, "Gomez", None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00451", "2023-00990"]);

        let hits = search_name(&store, "ana", None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00453", "2024-00451"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let store = sample_store();
        let params = SearchParams::default();
        let day = date(2024, 2, 3);
        let hits = search_date_range(&store, day, day, None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00452"]);

        let hits =
            search_date_range(&store, date(2024, 1, 1), date(2024, 12, 31), None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00453", "2024-00452", "2024-00451"]);
    }

    #[test]
    fn inverted_date_range_is_a_validation_error() {
        let store = sample_store();
        let err = search_date_range(
            &store,
            date(2024, 12, 31),
            date(2024, 1, 1),
            None,
            &SearchParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn filter_combines_criteria() {
        let store = sample_store();
        let criteria = FilterCriteria {
            classification: Some("queja".into()),
            text: Some("vía".into()),
            ..FilterCriteria::default()
        };
        let hits = filter(&store, &criteria, None, None, &SearchParams::default()).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00453", "2024-00451"]);
    }

    #[test]
    fn filter_puts_undated_last_and_honors_sort() {
        let store = sample_store();
        let params = SearchParams::default();
        let criteria = FilterCriteria {
            status: Some("PENDIENTE".into()),
            ..FilterCriteria::default()
        };
        let hits = filter(&store, &criteria, None, None, &params).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00452", "2024-00460"]);

        let by_id = SortSpec {
            field: CanonicalField::CaseId,
            order: SortOrder::Asc,
        };
        let hits = filter(&store, &FilterCriteria::default(), Some(by_id), None, &params).unwrap();
        assert_eq!(
            ids(&hits),
            vec!["2023-00990", "2024-00451", "2024-00452", "2024-00453", "2024-00460"]
        );
    }

    #[test]
    fn filter_by_case_id_is_exact() {
        let store = sample_store();
        let params = SearchParams::default();
        let exact = FilterCriteria {
            case_id: Some("2024-00452".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&store, &exact, None, None, &params).unwrap().matched_count, 1);

        let prefix = FilterCriteria {
            case_id: Some("2024-0045".into()),
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&store, &prefix, None, None, &params).unwrap().matched_count, 0);
    }

    #[test]
    fn filter_accepts_open_ended_dates() {
        let store = sample_store();
        let criteria = FilterCriteria {
            filed_from: Some(date(2024, 2, 1)),
            ..FilterCriteria::default()
        };
        let hits = filter(&store, &criteria, None, None, &SearchParams::default()).unwrap();
        assert_eq!(ids(&hits), vec!["2024-00453", "2024-00452"]);

        let inverted = FilterCriteria {
            filed_from: Some(date(2024, 3, 1)),
            filed_to: Some(date(2024, 1, 1)),
            ..FilterCriteria::default()
        };
        assert!(filter(&store, &inverted, None, None, &SearchParams::default()).is_err());
    }

    #[test]
    fn blank_criteria_are_ignored() {
        let criteria = FilterCriteria {
            status: Some("   ".into()),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_empty());
        let store = sample_store();
        let all = matching(&store, &criteria, &SearchParams::default()).unwrap();
        assert_eq!(all.len(), store.len());
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("descending".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }
}
