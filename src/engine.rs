//! The query engine facade.
//!
//! [`Engine`] owns the configuration-derived parsers and parameters plus the
//! published record generation. Every operation takes `&self`, so one
//! engine can be shared across threads; queries never block on a reload.
//!
//! ```text
//! load_or_reload:  loader::load ─▶ normalize_rows ─▶ RecordStore::build ─▶ publish
//! query et al.:    snapshot (Arc clone) ─▶ core strategy ─▶ owned page
//! ```
//!
//! The first query on a fresh engine triggers the initial load.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use chrono::NaiveDate;
use pqrs_query_core::aggregate::{
    aggregate, summarize_matches, AggregateParams, FilterSummary, StatisticsSummary,
};
use pqrs_query_core::classify::{QueryClassifier, QueryParams, Strategy};
use pqrs_query_core::dispatch::run_query;
use pqrs_query_core::help::QueryHelp;
use pqrs_query_core::models::{CanonicalField, DataQualityIssue, Record, SourceKind};
use pqrs_query_core::normalize::{normalize_rows, DateParser, Normalized, SynonymTable};
use pqrs_query_core::search::{self, FilterCriteria, SearchHits, SearchParams, SortOrder, SortSpec};
use pqrs_query_core::store::{RecordStore, SharedStore};
use pqrs_query_core::suggest::{self, SuggestParams};
use pqrs_query_core::{EngineError, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::loader;

/// Number of top values per attribute in a [`FilterPage`] summary.
const FILTER_SUMMARY_TOP: usize = 5;

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub generation_id: u64,
    pub row_count: usize,
    pub record_count: usize,
    pub source_kind: SourceKind,
    pub source_path: PathBuf,
    pub fingerprint: String,
    /// The source bytes are identical to the previous generation's.
    pub unchanged: bool,
    pub issues: Vec<DataQualityIssue>,
}

/// Answer to a natural-language request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub generation_id: u64,
    pub strategy: Strategy,
    pub params: QueryParams,
    pub matched_count: usize,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<QueryHelp>,
}

/// One page of strategy results. `matched_count` counts matches before
/// the limit, so `records.len() < matched_count` means truncation.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub generation_id: u64,
    pub matched_count: usize,
    pub records: Vec<Record>,
}

impl SearchPage {
    fn from_hits(generation_id: u64, hits: SearchHits<'_>) -> Self {
        Self {
            generation_id,
            matched_count: hits.matched_count,
            records: hits.records.into_iter().cloned().collect(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.records.len() < self.matched_count
    }
}

/// A filter page plus a summary of the whole matched set.
#[derive(Debug, Clone, Serialize)]
pub struct FilterPage {
    #[serde(flatten)]
    pub page: SearchPage,
    pub summary: FilterSummary,
}

pub struct Engine {
    config: Config,
    synonyms: SynonymTable,
    dates: DateParser,
    classifier: QueryClassifier,
    search: SearchParams,
    aggregate: AggregateParams,
    suggest: SuggestParams,
    shared: SharedStore,
    reload_lock: Mutex<()>,
}

impl Engine {
    /// Build an engine from a validated configuration. Nothing is loaded yet.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        Ok(Self {
            synonyms: config.synonym_table()?,
            dates: config.date_parser()?,
            classifier: config.query_classifier()?,
            search: config.search_params(),
            aggregate: config.aggregate_params(),
            suggest: config.suggest_params(),
            config,
            shared: SharedStore::new(),
            reload_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse a date the way the loader parses `filed_date` values.
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.dates.parse_text(value)
    }

    /// Read the source again and publish a new generation.
    ///
    /// In-flight queries keep the generation they started with. Concurrent
    /// reloads run one after another.
    pub fn load_or_reload(&self) -> Result<LoadReport> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.reload_locked().map(|(report, _)| report)
    }

    /// The published generation, loading one first if none exists.
    pub fn current(&self) -> Result<Arc<RecordStore>> {
        if let Some(store) = self.shared.snapshot() {
            return Ok(store);
        }
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished the first load while we waited.
        if let Some(store) = self.shared.snapshot() {
            return Ok(store);
        }
        self.reload_locked().map(|(_, store)| store)
    }

    fn reload_locked(&self) -> Result<(LoadReport, Arc<RecordStore>)> {
        let raw = loader::load(&self.config.source)?;
        let Normalized {
            records,
            mut issues,
        } = normalize_rows(&raw, &self.synonyms, &self.dates);
        let provenance = raw.provenance;

        let store = RecordStore::build(
            self.shared.next_generation_id(),
            records,
            Some(provenance.clone()),
        );
        issues.extend(store.duplicate_issues().iter().cloned());
        let (store, previous) = self.shared.publish(store);

        let unchanged = previous
            .as_deref()
            .and_then(RecordStore::provenance)
            .is_some_and(|p| p.fingerprint == provenance.fingerprint);

        let report = LoadReport {
            generation_id: store.generation_id(),
            row_count: provenance.row_count,
            record_count: store.len(),
            source_kind: provenance.source_kind,
            source_path: provenance.path,
            fingerprint: provenance.fingerprint,
            unchanged,
            issues,
        };

        log::info!(
            "generation {} published: {} records from {} rows ({})",
            report.generation_id,
            report.record_count,
            report.row_count,
            report.source_kind
        );
        if !report.issues.is_empty() {
            log::warn!("{} data-quality issues in {}", report.issues.len(), report.source_path.display());
            for issue in &report.issues {
                log::debug!("{}", issue);
            }
        }

        Ok((report, store))
    }

    /// Classify `raw` (or apply `hint`) and run the chosen strategy.
    pub fn query(&self, raw: &str, hint: Option<Strategy>, limit: Option<usize>) -> Result<QueryResponse> {
        let store = self.current()?;
        let outcome = run_query(
            &store,
            &self.classifier,
            raw,
            hint,
            limit,
            &self.search,
            &self.aggregate,
        )?;
        Ok(QueryResponse {
            generation_id: store.generation_id(),
            strategy: outcome.strategy,
            params: outcome.params,
            matched_count: outcome.matched_count,
            records: outcome.records.into_iter().cloned().collect(),
            statistics: outcome.statistics,
            help: outcome.help,
        })
    }

    pub fn lookup_by_id(&self, case_id: &str) -> Result<Record> {
        if case_id.trim().is_empty() {
            return Err(EngineError::validation("case id is empty"));
        }
        let store = self.current()?;
        search::lookup(&store, case_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(case_id.trim().to_string()))
    }

    pub fn search_text(&self, text: &str, limit: Option<usize>) -> Result<SearchPage> {
        let store = self.current()?;
        let hits = search::search_text(&store, text, limit, &self.search)?;
        Ok(SearchPage::from_hits(store.generation_id(), hits))
    }

    pub fn search_name(&self, fragment: &str, limit: Option<usize>) -> Result<SearchPage> {
        let store = self.current()?;
        let hits = search::search_name(&store, fragment, limit, &self.search)?;
        Ok(SearchPage::from_hits(store.generation_id(), hits))
    }

    /// Records filed within `[start, end]`; an inverted range is rejected.
    pub fn search_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: Option<usize>,
    ) -> Result<SearchPage> {
        let store = self.current()?;
        let hits = search::search_date_range(&store, start, end, limit, &self.search)?;
        Ok(SearchPage::from_hits(store.generation_id(), hits))
    }

    /// Conjunctive filter, sorted by `sort_by` (default `filed_date`) in
    /// `order` (default descending).
    pub fn filter(
        &self,
        criteria: &FilterCriteria,
        sort_by: Option<CanonicalField>,
        order: Option<SortOrder>,
        limit: Option<usize>,
    ) -> Result<FilterPage> {
        let store = self.current()?;
        let sort = SortSpec {
            field: sort_by.unwrap_or(CanonicalField::FiledDate),
            order: order.unwrap_or_default(),
        };
        let (hits, all) =
            search::filter_with_matches(&store, criteria, Some(sort), limit, &self.search)?;
        let summary = summarize_matches(&all, FILTER_SUMMARY_TOP, &self.aggregate.unspecified_label);
        Ok(FilterPage {
            page: SearchPage::from_hits(store.generation_id(), hits),
            summary,
        })
    }

    /// Every record matching `criteria`, in load order, with no limit.
    pub fn matching(&self, criteria: &FilterCriteria) -> Result<SearchPage> {
        let store = self.current()?;
        let records: Vec<Record> = search::matching(&store, criteria, &self.search)?
            .into_iter()
            .cloned()
            .collect();
        Ok(SearchPage {
            generation_id: store.generation_id(),
            matched_count: records.len(),
            records,
        })
    }

    /// Statistics over the whole store, or over the records matching `subset`.
    pub fn aggregate(&self, subset: Option<&FilterCriteria>) -> Result<StatisticsSummary> {
        let store = self.current()?;
        let records: Vec<&Record> = match subset {
            Some(criteria) => search::matching(&store, criteria, &self.search)?,
            None => store.records().iter().collect(),
        };
        Ok(aggregate(&records, &self.aggregate))
    }

    /// Category values containing `fragment`; empty when it is too short.
    pub fn suggest(&self, fragment: &str) -> Result<Vec<String>> {
        let store = self.current()?;
        Ok(suggest::suggest(&store, fragment, &self.suggest))
    }
}
