//! Query classification: decide which retrieval strategy a raw request
//! needs and extract the parameters that strategy takes.
//!
//! Classification is an ordered list of predicates evaluated first to
//! last; the first one that matches decides the strategy. Free-text search
//! is the fallback, so classification never fails for unrecognized text.
//!
//! | Order | Predicate | Strategy |
//! |-------|-----------|----------|
//! | 1 | whole text is a help cue | [`Strategy::Help`] |
//! | 2 | whole text is a case id | [`Strategy::ExactLookup`] |
//! | 3 | two or more dates in the text | [`Strategy::DateRange`] |
//! | 4 | a name cue followed by a fragment | [`Strategy::NameMatch`] |
//! | 5 | an aggregate cue | [`Strategy::Aggregate`] |
//! | - | anything else | [`Strategy::FreeText`] |
//!
//! A caller-supplied hint skips the predicates and is used as given.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::normalize::DateParser;
use crate::search::FilterCriteria;
use crate::text::fold;

/// Default case-id shape: optional letter prefix, four or more digits,
/// optional numeric suffixes (`2024-00451`, `PQR-123456`, `12345/2`).
///
/// A candidate that also reads as a separated date (`2024-01-15`) is not
/// an id; an all-digit one (`20240105`) always is.
pub const DEFAULT_CASE_ID_PATTERN: &str = r"^(?:[A-Za-z]{1,6}-?)?\d{4,}(?:[-/]\d+)*$";

pub const DEFAULT_NAME_CUES: &[&str] = &[
    "a nombre de",
    "por nombre",
    "nombre de",
    "nombre",
    "solicitante",
    "peticionario",
    "peticionaria",
    "ciudadano",
    "ciudadana",
    "radicada por",
    "radicado por",
    "requester",
    "filed by",
    "by name",
    "named",
];

pub const DEFAULT_AGGREGATE_CUES: &[&str] = &[
    "cuantas",
    "cuantos",
    "estadistica",
    "estadisticas",
    "cantidad de",
    "total de",
    "conteo",
    "resumen",
    "distribucion",
    "how many",
    "statistics",
    "stats",
    "count of",
    "summary",
    "breakdown",
];

/// Whole requests that ask for the query guide.
pub const DEFAULT_HELP_CUES: &[&str] = &["ayuda", "help", "como usar", "instrucciones"];

/// Retrieval strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactLookup,
    FreeText,
    NameMatch,
    DateRange,
    Combined,
    Aggregate,
    Help,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ExactLookup => "exact_lookup",
            Strategy::FreeText => "free_text",
            Strategy::NameMatch => "name_match",
            Strategy::DateRange => "date_range",
            Strategy::Combined => "combined",
            Strategy::Aggregate => "aggregate",
            Strategy::Help => "help",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match fold(s.trim()).replace(['-', ' '], "_").as_str() {
            "exact_lookup" | "exact" | "id" | "radicado" => Ok(Strategy::ExactLookup),
            "free_text" | "text" | "texto" => Ok(Strategy::FreeText),
            "name_match" | "name" | "nombre" => Ok(Strategy::NameMatch),
            "date_range" | "date" | "dates" | "fechas" => Ok(Strategy::DateRange),
            "combined" | "filter" | "advanced" => Ok(Strategy::Combined),
            "aggregate" | "stats" | "statistics" | "estadisticas" => Ok(Strategy::Aggregate),
            "help" | "ayuda" => Ok(Strategy::Help),
            _ => Err(EngineError::validation(format!(
                "unknown strategy hint '{}'; expected one of: exact_lookup, free_text, \
                 name_match, date_range, combined, aggregate, help",
                s
            ))),
        }
    }
}

/// Parameters extracted for the chosen strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryParams {
    Identifier { case_id: String },
    Text { text: String },
    Name { fragment: String },
    Dates { start: NaiveDate, end: NaiveDate },
    Criteria { criteria: FilterCriteria },
    Aggregate,
    Help,
}

/// A request after classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedQuery {
    pub strategy: Strategy,
    pub params: QueryParams,
}

type Predicate = fn(&QueryClassifier, &str) -> Option<QueryParams>;

/// Predicates in priority order.
const RULES: &[(Strategy, Predicate)] = &[
    (Strategy::Help, QueryClassifier::help_request),
    (Strategy::ExactLookup, QueryClassifier::identifier),
    (Strategy::DateRange, QueryClassifier::date_pair),
    (Strategy::NameMatch, QueryClassifier::name_fragment),
    (Strategy::Aggregate, QueryClassifier::aggregate_request),
];

/// Rule-based classifier; cues and patterns are configurable.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    case_id: Regex,
    date_token: Regex,
    /// Folded, longest first.
    name_cues: Vec<String>,
    /// Folded.
    aggregate_cues: Vec<String>,
    /// Folded.
    help_cues: Vec<String>,
    dates: DateParser,
}

impl QueryClassifier {
    /// Classifier with the built-in pattern and cue lists.
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            DEFAULT_CASE_ID_PATTERN,
            DEFAULT_NAME_CUES,
            DEFAULT_AGGREGATE_CUES,
            DEFAULT_HELP_CUES,
            DateParser::default(),
        )
    }

    pub fn new<S: AsRef<str>>(
        case_id_pattern: &str,
        name_cues: &[S],
        aggregate_cues: &[S],
        help_cues: &[S],
        dates: DateParser,
    ) -> Result<Self> {
        let case_id = Regex::new(case_id_pattern).map_err(|e| {
            EngineError::validation(format!("invalid case id pattern '{}': {}", case_id_pattern, e))
        })?;
        let date_token = Regex::new(r"\d{1,4}[/.-]\d{1,2}[/.-]\d{1,4}")
            .map_err(|e| EngineError::validation(e.to_string()))?;

        let mut name_cues = fold_cues(name_cues);
        name_cues.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        Ok(Self {
            case_id,
            date_token,
            name_cues,
            aggregate_cues: fold_cues(aggregate_cues),
            help_cues: fold_cues(help_cues),
            dates,
        })
    }

    /// Classify `text`, or apply `hint` verbatim when given.
    ///
    /// Only a `date_range` hint can fail: the text must contain two dates.
    pub fn classify(&self, text: &str, hint: Option<Strategy>) -> Result<ClassifiedQuery> {
        if let Some(strategy) = hint {
            let params = self.params_for(strategy, text)?;
            log::debug!("query routed by hint to {}", strategy);
            return Ok(ClassifiedQuery { strategy, params });
        }

        for (strategy, predicate) in RULES {
            if let Some(params) = predicate(self, text) {
                log::debug!("query classified as {}", strategy);
                return Ok(ClassifiedQuery {
                    strategy: *strategy,
                    params,
                });
            }
        }

        log::debug!("query classified as {}", Strategy::FreeText);
        Ok(ClassifiedQuery {
            strategy: Strategy::FreeText,
            params: QueryParams::Text {
                text: text.trim().to_string(),
            },
        })
    }

    fn params_for(&self, strategy: Strategy, text: &str) -> Result<QueryParams> {
        let trimmed = text.trim().to_string();
        Ok(match strategy {
            Strategy::ExactLookup => QueryParams::Identifier { case_id: trimmed },
            Strategy::FreeText => QueryParams::Text { text: trimmed },
            Strategy::NameMatch => self
                .name_fragment(text)
                .unwrap_or(QueryParams::Name { fragment: trimmed }),
            Strategy::DateRange => self.date_pair(text).ok_or_else(|| {
                EngineError::validation(format!(
                    "a date range needs two dates, found fewer in '{}'",
                    trimmed
                ))
            })?,
            Strategy::Combined => QueryParams::Criteria {
                criteria: FilterCriteria {
                    text: Some(trimmed),
                    ..FilterCriteria::default()
                },
            },
            Strategy::Aggregate => QueryParams::Aggregate,
            Strategy::Help => QueryParams::Help,
        })
    }

    /// The whole request, ignoring case, accents and surrounding
    /// punctuation, is a help cue.
    pub fn help_request(&self, text: &str) -> Option<QueryParams> {
        let folded = fold(text);
        let request = folded.trim_matches(|c: char| !c.is_alphanumeric());
        self.help_cues
            .iter()
            .any(|cue| cue == request)
            .then_some(QueryParams::Help)
    }

    /// The whole request (minus surrounding punctuation) looks like a case
    /// id and is not itself a separated date.
    pub fn identifier(&self, text: &str) -> Option<QueryParams> {
        let candidate = text
            .trim()
            .trim_start_matches('#')
            .trim_end_matches(['?', '.', '!', ',', ';', ':']);
        if candidate.is_empty() || !self.case_id.is_match(candidate) {
            return None;
        }
        if self.date_token.is_match(candidate) && self.dates.parse_text(candidate).is_some() {
            return None;
        }
        Some(QueryParams::Identifier {
            case_id: candidate.to_string(),
        })
    }

    /// The first two parseable dates, in the order they appear.
    pub fn date_pair(&self, text: &str) -> Option<QueryParams> {
        let mut found = self
            .date_token
            .find_iter(text)
            .filter_map(|m| self.dates.parse_text(m.as_str()));
        let start = found.next()?;
        let end = found.next()?;
        Some(QueryParams::Dates { start, end })
    }

    /// The text following the first name cue, if any is left.
    pub fn name_fragment(&self, text: &str) -> Option<QueryParams> {
        let folded = fold(text);
        self.name_cues.iter().find_map(|cue| {
            let at = find_phrase(&folded, cue)?;
            let rest = folded[at + cue.len()..]
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string();
            (!rest.is_empty()).then_some(QueryParams::Name { fragment: rest })
        })
    }

    /// The text contains an aggregate cue.
    pub fn aggregate_request(&self, text: &str) -> Option<QueryParams> {
        let folded = fold(text);
        self.aggregate_cues
            .iter()
            .any(|cue| find_phrase(&folded, cue).is_some())
            .then_some(QueryParams::Aggregate)
    }
}

fn fold_cues<S: AsRef<str>>(cues: &[S]) -> Vec<String> {
    cues.iter()
        .map(|c| fold(c.as_ref().trim()))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Byte offset of `phrase` in `haystack` where it is not part of a longer
/// word.
fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    haystack.match_indices(phrase).map(|(at, _)| at).find(|&at| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
