//! Statistics overview (`pqrs stats`).
//!
//! Counts by status, classification, year and month, the busiest
//! neighborhoods and units, and the filing-date extent. Optional criteria
//! restrict the summary to a subset.

use anyhow::Result;
use pqrs_query_core::aggregate::StatisticsSummary;

use crate::engine::Engine;
use crate::output::{print_buckets, print_json};
use crate::search::CriteriaArgs;

pub fn run_stats(engine: &Engine, criteria: &CriteriaArgs, json: bool) -> Result<()> {
    let criteria = criteria.to_criteria(engine)?;
    let subset = (!criteria.is_empty()).then_some(&criteria);
    let summary = engine.aggregate(subset)?;

    if json {
        return print_json(&summary);
    }
    print_statistics(&summary);
    Ok(())
}

pub fn print_statistics(s: &StatisticsSummary) {
    println!("PQRS Query: Statistics");
    println!("======================");
    println!();
    println!("  Records:     {}", s.total);
    match (s.earliest_filed, s.latest_filed) {
        (Some(first), Some(last)) => println!("  Filed:       {} .. {}", first, last),
        _ => println!("  Filed:       (no dated records)"),
    }
    println!("  Undated:     {}", s.undated);

    print_buckets("By status", &s.by_status);
    print_buckets("By classification", &s.by_classification);
    print_buckets("By year", &s.by_year);
    print_buckets("By month", &s.by_month);
    print_buckets("Top neighborhoods", &s.top_neighborhoods);
    print_buckets("Top units", &s.top_responsible_units);
    println!();
}
