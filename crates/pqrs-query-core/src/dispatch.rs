//! Route a classified request to its strategy and shape the response.

use serde::Serialize;

use crate::aggregate::{aggregate, AggregateParams, StatisticsSummary};
use crate::classify::{ClassifiedQuery, QueryClassifier, QueryParams, Strategy};
use crate::error::Result;
use crate::help::{query_help, QueryHelp};
use crate::models::Record;
use crate::search::{self, SearchParams};
use crate::store::RecordStore;

/// Outcome of one natural-language request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome<'a> {
    pub strategy: Strategy,
    pub params: QueryParams,
    pub records: Vec<&'a Record>,
    /// Matches before the limit; for aggregate requests, the number of
    /// records summarized.
    pub matched_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<QueryHelp>,
}

/// Classify `text` (or apply `hint`) and execute it against `store`.
pub fn run_query<'a>(
    store: &'a RecordStore,
    classifier: &QueryClassifier,
    text: &str,
    hint: Option<Strategy>,
    limit: Option<usize>,
    search_params: &SearchParams,
    aggregate_params: &AggregateParams,
) -> Result<QueryOutcome<'a>> {
    let ClassifiedQuery { strategy, params } = classifier.classify(text, hint)?;

    let (records, matched_count, statistics) = match &params {
        QueryParams::Identifier { case_id } => {
            // Validates the limit even though at most one record can match.
            search_params.resolve_limit(limit)?;
            let found: Vec<&Record> = search::lookup(store, case_id).into_iter().collect();
            let n = found.len();
            (found, n, None)
        }
        QueryParams::Text { text } => {
            let hits = search::search_text(store, text, limit, search_params)?;
            (hits.records, hits.matched_count, None)
        }
        QueryParams::Name { fragment } => {
            let hits = search::search_name(store, fragment, limit, search_params)?;
            (hits.records, hits.matched_count, None)
        }
        QueryParams::Dates { start, end } => {
            let hits = search::search_date_range(store, *start, *end, limit, search_params)?;
            (hits.records, hits.matched_count, None)
        }
        QueryParams::Criteria { criteria } => {
            let hits = search::filter(store, criteria, None, limit, search_params)?;
            (hits.records, hits.matched_count, None)
        }
        QueryParams::Aggregate => {
            let all: Vec<&Record> = store.records().iter().collect();
            let summary = aggregate(&all, aggregate_params);
            (Vec::new(), summary.total, Some(summary))
        }
        QueryParams::Help => (Vec::new(), 0, None),
    };
    let help = matches!(params, QueryParams::Help).then(query_help);

    log::debug!(
        "query '{}' -> {} ({} matched, {} returned)",
        text,
        strategy,
        matched_count,
        records.len()
    );

    Ok(QueryOutcome {
        strategy,
        params,
        records,
        matched_count,
        statistics,
        help,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testutil::sample_store;

    fn run<'a>(store: &'a RecordStore, text: &str, hint: Option<Strategy>) -> Result<QueryOutcome<'a>> {
        let classifier = QueryClassifier::with_defaults().unwrap();
        run_query(
            store,
            &classifier,
            text,
            hint,
            None,
            &SearchParams::default(),
            &AggregateParams::default(),
        )
    }

    #[test]
    fn identifier_returns_the_single_record() {
        let store = sample_store();
        let out = run(&store, "2024-00451", None).unwrap();
        assert_eq!(out.strategy, Strategy::ExactLookup);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].case_id, "2024-00451");
    }

    #[test]
    fn unknown_identifier_is_an_empty_result() {
        let store = sample_store();
        let out = run(&store, "2099-99999", None).unwrap();
        assert_eq!(out.strategy, Strategy::ExactLookup);
        assert!(out.records.is_empty());
        assert_eq!(out.matched_count, 0);
    }

    #[test]
    fn aggregate_request_carries_statistics() {
        let store = sample_store();
        let out = run(&store, "¿Cuántas PQRS hay?", None).unwrap();
        assert_eq!(out.strategy, Strategy::Aggregate);
        assert!(out.records.is_empty());
        assert_eq!(out.statistics.unwrap().total, store.len());
    }

    #[test]
    fn help_request_carries_the_guide() {
        let store = sample_store();
        let out = run(&store, "ayuda", None).unwrap();
        assert_eq!(out.strategy, Strategy::Help);
        assert!(out.records.is_empty());
        assert_eq!(out.help.unwrap(), query_help());

        let out = run(&store, "ruido", None).unwrap();
        assert!(out.help.is_none());
    }

    #[test]
    fn date_range_request_is_inclusive() {
        let store = sample_store();
        let out = run(&store, "entre 01/01/2024 y 31/01/2024", None).unwrap();
        assert_eq!(out.strategy, Strategy::DateRange);
        assert_eq!(out.matched_count, 1);
    }

    #[test]
    fn inverted_range_surfaces_validation() {
        let store = sample_store();
        let err = run(&store, "entre 31/12/2024 y 01/01/2024", None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn prose_and_combined_hint_use_text_matching() {
        let store = sample_store();
        let out = run(&store, "ruido nocturno", None).unwrap();
        assert_eq!(out.strategy, Strategy::FreeText);
        assert_eq!(out.records[0].case_id, "2024-00453");

        let out = run(&store, "ruido nocturno", Some(Strategy::Combined)).unwrap();
        assert_eq!(out.strategy, Strategy::Combined);
        assert_eq!(out.matched_count, 1);
    }
}
