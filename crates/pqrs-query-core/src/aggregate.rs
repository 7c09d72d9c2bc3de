//! Aggregate statistics over a set of records.
//!
//! Every grouping counts each record exactly once: records missing the
//! grouped attribute land in an explicit "unspecified" bucket, so bucket
//! counts always sum to the number of records summarized.
//!
//! Categorical values are grouped case- and accent-insensitively; a bucket
//! is labelled with the first spelling seen.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::Record;
use crate::text::fold;

/// Aggregation tuning.
#[derive(Debug, Clone)]
pub struct AggregateParams {
    /// Size of the top-neighborhood and top-unit lists.
    pub top_n: usize,
    /// Label of the bucket for records missing the attribute.
    pub unspecified_label: String,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            top_n: 10,
            unspecified_label: "unspecified".to_string(),
        }
    }
}

/// One group and its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub count: usize,
}

impl Bucket {
    fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Statistics over one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total: usize,
    pub by_status: Vec<Bucket>,
    pub by_classification: Vec<Bucket>,
    /// `YYYY`, chronological, unspecified last.
    pub by_year: Vec<Bucket>,
    /// `YYYY-MM`, chronological, unspecified last.
    pub by_month: Vec<Bucket>,
    pub top_neighborhoods: Vec<Bucket>,
    pub top_responsible_units: Vec<Bucket>,
    pub earliest_filed: Option<NaiveDate>,
    pub latest_filed: Option<NaiveDate>,
    pub undated: usize,
}

/// Compute a [`StatisticsSummary`] over `records`.
pub fn aggregate(records: &[&Record], params: &AggregateParams) -> StatisticsSummary {
    let label = params.unspecified_label.as_str();
    let dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.filed_date).collect();

    StatisticsSummary {
        total: records.len(),
        by_status: by_count(group(records, label, |r| r.status.as_deref())),
        by_classification: by_count(group(records, label, |r| r.classification.as_deref())),
        by_year: by_period(records, label, |d| format!("{:04}", d.year())),
        by_month: by_period(records, label, |d| {
            format!("{:04}-{:02}", d.year(), d.month())
        }),
        top_neighborhoods: top(group(records, label, |r| r.neighborhood.as_deref()), params.top_n),
        top_responsible_units: top(
            group(records, label, |r| r.responsible_unit.as_deref()),
            params.top_n,
        ),
        earliest_filed: dates.iter().min().copied(),
        latest_filed: dates.iter().max().copied(),
        undated: records.len() - dates.len(),
    }
}

/// Short breakdown attached to filter results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub total_matched: usize,
    pub top_classifications: Vec<Bucket>,
    pub top_statuses: Vec<Bucket>,
    pub top_responsible_units: Vec<Bucket>,
    pub top_neighborhoods: Vec<Bucket>,
    pub earliest_filed: Option<NaiveDate>,
    pub latest_filed: Option<NaiveDate>,
}

/// Top-`n` classification, status, unit and neighborhood buckets among
/// `records`, plus the span of their filing dates.
pub fn summarize_matches(records: &[&Record], n: usize, unspecified_label: &str) -> FilterSummary {
    let dates = || records.iter().filter_map(|r| r.filed_date);
    FilterSummary {
        total_matched: records.len(),
        top_classifications: top(group(records, unspecified_label, |r| r.classification.as_deref()), n),
        top_statuses: top(group(records, unspecified_label, |r| r.status.as_deref()), n),
        top_responsible_units: top(
            group(records, unspecified_label, |r| r.responsible_unit.as_deref()),
            n,
        ),
        top_neighborhoods: top(group(records, unspecified_label, |r| r.neighborhood.as_deref()), n),
        earliest_filed: dates().min(),
        latest_filed: dates().max(),
    }
}

/// Count records per folded value of `attr`, preserving first-seen labels.
fn group<F>(records: &[&Record], unspecified: &str, attr: F) -> Vec<Bucket>
where
    F: Fn(&Record) -> Option<&str>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut missing = 0usize;

    for r in records {
        match attr(*r) {
            Some(value) => {
                let slot = *slots.entry(fold(value)).or_insert_with(|| {
                    buckets.push(Bucket::new(value, 0));
                    buckets.len() - 1
                });
                buckets[slot].count += 1;
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        buckets.push(Bucket::new(unspecified, missing));
    }
    buckets
}

/// Count desc, then key asc.
fn by_count(mut buckets: Vec<Bucket>) -> Vec<Bucket> {
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

fn top(buckets: Vec<Bucket>, n: usize) -> Vec<Bucket> {
    let mut sorted = by_count(buckets);
    sorted.truncate(n);
    sorted
}

fn by_period<F>(records: &[&Record], unspecified: &str, period: F) -> Vec<Bucket>
where
    F: Fn(NaiveDate) -> String,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut missing = 0usize;
    for r in records {
        match r.filed_date {
            Some(d) => *counts.entry(period(d)).or_insert(0) += 1,
            None => missing += 1,
        }
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(key, count)| Bucket::new(key, count))
        .collect();
    if missing > 0 {
        buckets.push(Bucket::new(unspecified, missing));
    }
    buckets
}
