//! TOML configuration.
//!
//! Only `[source].dir` is required; every other section falls back to
//! defaults. See `config/pqrs.example.toml` for a full example.

use anyhow::{bail, Context, Result};
use pqrs_query_core::aggregate::AggregateParams;
use pqrs_query_core::classify::{
    QueryClassifier, DEFAULT_AGGREGATE_CUES, DEFAULT_CASE_ID_PATTERN, DEFAULT_HELP_CUES,
    DEFAULT_NAME_CUES,
};
use pqrs_query_core::normalize::{DateParser, SynonymTable, DEFAULT_DATE_FORMATS};
use pqrs_query_core::search::{SearchParams, DEFAULT_STOPWORDS, DEFAULT_TEXT_EXTRA_COLUMNS};
use pqrs_query_core::suggest::SuggestParams;
use pqrs_query_core::text::{fold, fold_header};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Directory holding the spreadsheet and/or delimited export.
    pub dir: PathBuf,
    /// Spreadsheet file name inside `dir`; else the first glob match.
    #[serde(default)]
    pub spreadsheet_file: Option<String>,
    #[serde(default = "default_spreadsheet_globs")]
    pub spreadsheet_globs: Vec<String>,
    /// Delimited file name inside `dir`; else the first glob match.
    #[serde(default)]
    pub delimited_file: Option<String>,
    #[serde(default = "default_delimited_globs")]
    pub delimited_globs: Vec<String>,
    /// Field delimiter; detected from the header line when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Worksheet name; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
}

fn default_spreadsheet_globs() -> Vec<String> {
    vec!["*.xlsx".to_string()]
}
fn default_delimited_globs() -> Vec<String> {
    vec!["*.csv".to_string(), "*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    /// Ordered `chrono` formats tried for `filed_date`.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    /// Canonical name (or requester-name part key) to extra header synonyms.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            date_formats: default_date_formats(),
            synonyms: BTreeMap::new(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_case_id_pattern")]
    pub case_id_pattern: String,
    #[serde(default = "default_name_cues")]
    pub name_cues: Vec<String>,
    #[serde(default = "default_aggregate_cues")]
    pub aggregate_cues: Vec<String>,
    /// Whole requests answered with the query guide.
    #[serde(default = "default_help_cues")]
    pub help_cues: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            case_id_pattern: default_case_id_pattern(),
            name_cues: default_name_cues(),
            aggregate_cues: default_aggregate_cues(),
            help_cues: default_help_cues(),
        }
    }
}

fn default_case_id_pattern() -> String {
    DEFAULT_CASE_ID_PATTERN.to_string()
}
fn default_name_cues() -> Vec<String> {
    DEFAULT_NAME_CUES.iter().map(|c| c.to_string()).collect()
}
fn default_aggregate_cues() -> Vec<String> {
    DEFAULT_AGGREGATE_CUES.iter().map(|c| c.to_string()).collect()
}
fn default_help_cues() -> Vec<String> {
    DEFAULT_HELP_CUES.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Free-text search also scans `status` and `classification`.
    #[serde(default = "default_true")]
    pub search_categories: bool,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    /// Headers of unmapped columns that free-text search also scans.
    #[serde(default = "default_text_extra_columns")]
    pub text_extra_columns: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            search_categories: true,
            stopwords: default_stopwords(),
            text_extra_columns: default_text_extra_columns(),
        }
    }
}

fn default_limit() -> usize {
    100
}
fn default_max_limit() -> usize {
    1000
}
fn default_true() -> bool {
    true
}
fn default_stopwords() -> Vec<String> {
    DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect()
}
fn default_text_extra_columns() -> Vec<String> {
    DEFAULT_TEXT_EXTRA_COLUMNS.iter().map(|h| h.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregateConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_unspecified_label")]
    pub unspecified_label: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            unspecified_label: default_unspecified_label(),
        }
    }
}

fn default_top_n() -> usize {
    10
}
fn default_unspecified_label() -> String {
    "unspecified".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SuggestConfig {
    #[serde(default = "default_min_fragment_len")]
    pub min_fragment_len: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            min_fragment_len: default_min_fragment_len(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

fn default_min_fragment_len() -> usize {
    2
}
fn default_max_suggestions() -> usize {
    10
}

impl Config {
    /// All defaults, reading sources from `dir`.
    pub fn for_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: SourceConfig {
                dir: dir.into(),
                spreadsheet_file: None,
                spreadsheet_globs: default_spreadsheet_globs(),
                delimited_file: None,
                delimited_globs: default_delimited_globs(),
                delimiter: None,
                sheet: None,
            },
            normalize: NormalizeConfig::default(),
            classifier: ClassifierConfig::default(),
            retrieval: RetrievalConfig::default(),
            aggregate: AggregateConfig::default(),
            suggest: SuggestConfig::default(),
        }
    }

    /// Check every constraint `load_config` enforces.
    pub fn validate(&self) -> Result<()> {
        let src = &self.source;
        if src.spreadsheet_globs.is_empty()
            && src.spreadsheet_file.is_none()
            && src.delimited_globs.is_empty()
            && src.delimited_file.is_none()
        {
            bail!("source: at least one file name or glob is required");
        }
        if let Some(d) = src.delimiter {
            if !d.is_ascii() {
                bail!("source.delimiter must be a single ASCII character, got '{}'", d);
            }
        }

        if self.retrieval.default_limit < 1 {
            bail!("retrieval.default_limit must be >= 1");
        }
        if self.retrieval.max_limit < self.retrieval.default_limit {
            bail!("retrieval.max_limit must be >= retrieval.default_limit");
        }
        if self.aggregate.top_n < 1 {
            bail!("aggregate.top_n must be >= 1");
        }
        if self.suggest.min_fragment_len < 1 {
            bail!("suggest.min_fragment_len must be >= 1");
        }
        if self.suggest.max_suggestions < 1 {
            bail!("suggest.max_suggestions must be >= 1");
        }

        self.date_parser()?;
        self.synonym_table()?;
        self.query_classifier()?;
        Ok(())
    }

    pub fn date_parser(&self) -> Result<DateParser> {
        DateParser::new(&self.normalize.date_formats).context("normalize.date_formats")
    }

    /// Built-in synonym table extended with `[normalize.synonyms]`.
    pub fn synonym_table(&self) -> Result<SynonymTable> {
        let mut table = SynonymTable::builtin();
        for (key, synonyms) in &self.normalize.synonyms {
            table
                .extend(key, synonyms)
                .with_context(|| format!("normalize.synonyms.{}", key))?;
        }
        Ok(table)
    }

    pub fn query_classifier(&self) -> Result<QueryClassifier> {
        let c = &self.classifier;
        QueryClassifier::new(
            &c.case_id_pattern,
            &c.name_cues,
            &c.aggregate_cues,
            &c.help_cues,
            self.date_parser()?,
        )
        .context("classifier")
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            default_limit: self.retrieval.default_limit,
            max_limit: self.retrieval.max_limit,
            search_categories: self.retrieval.search_categories,
            stopwords: self.retrieval.stopwords.iter().map(|w| fold(w)).collect(),
            text_columns: self
                .retrieval
                .text_extra_columns
                .iter()
                .map(|h| fold_header(h))
                .collect(),
        }
    }

    pub fn aggregate_params(&self) -> AggregateParams {
        AggregateParams {
            top_n: self.aggregate.top_n,
            unspecified_label: self.aggregate.unspecified_label.clone(),
        }
    }

    pub fn suggest_params(&self) -> SuggestParams {
        SuggestParams {
            min_fragment_len: self.suggest.min_fragment_len,
            max_suggestions: self.suggest.max_suggestions,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
