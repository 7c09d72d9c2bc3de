//! `pqrs query`, `text`, `name`, `range` and `filter`.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Args;
use pqrs_query_core::classify::{QueryParams, Strategy};
use pqrs_query_core::models::CanonicalField;
use pqrs_query_core::search::{FilterCriteria, SortOrder};

use crate::engine::{Engine, SearchPage};
use crate::help::print_query_help;
use crate::output::{print_buckets, print_json, print_page};
use crate::stats::print_statistics;

/// Combined-filter criteria shared by `filter`, `stats` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Every word must appear in the narrative.
    #[arg(long)]
    pub text: Option<String>,
    /// Exact case id.
    #[arg(long)]
    pub case_id: Option<String>,
    /// Every word must appear in the requester name.
    #[arg(long)]
    pub name: Option<String>,
    /// Filed on or after this date.
    #[arg(long)]
    pub from: Option<String>,
    /// Filed on or before this date.
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub classification: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// Responsible unit.
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub neighborhood: Option<String>,
}

impl CriteriaArgs {
    pub fn to_criteria(&self, engine: &Engine) -> Result<FilterCriteria> {
        Ok(FilterCriteria {
            text: self.text.clone(),
            case_id: self.case_id.clone(),
            requester_name: self.name.clone(),
            filed_from: self.from.as_deref().map(|s| parse_date(engine, s)).transpose()?,
            filed_to: self.to.as_deref().map(|s| parse_date(engine, s)).transpose()?,
            classification: self.classification.clone(),
            status: self.status.clone(),
            responsible_unit: self.unit.clone(),
            neighborhood: self.neighborhood.clone(),
        })
    }
}

pub fn parse_date(engine: &Engine, value: &str) -> Result<NaiveDate> {
    engine
        .parse_date(value)
        .ok_or_else(|| anyhow!("invalid date '{}'", value))
}

pub fn run_query(
    engine: &Engine,
    text: &str,
    hint: Option<Strategy>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let response = engine.query(text, hint, limit)?;
    if json {
        return print_json(&response);
    }

    println!("strategy: {}", response.strategy);
    match &response.params {
        QueryParams::Identifier { case_id } => println!("case id: {}", case_id),
        QueryParams::Name { fragment } => println!("name: {}", fragment),
        QueryParams::Dates { start, end } => println!("range: {} .. {}", start, end),
        QueryParams::Text { .. }
        | QueryParams::Criteria { .. }
        | QueryParams::Aggregate
        | QueryParams::Help => {}
    }
    println!();

    if let Some(help) = &response.help {
        print_query_help(help);
        return Ok(());
    }

    if let Some(stats) = &response.statistics {
        print_statistics(stats);
        return Ok(());
    }
    print_page(&SearchPage {
        generation_id: response.generation_id,
        matched_count: response.matched_count,
        records: response.records,
    });
    Ok(())
}

pub fn run_text(engine: &Engine, text: &str, limit: Option<usize>, json: bool) -> Result<()> {
    render(&engine.search_text(text, limit)?, json)
}

pub fn run_name(engine: &Engine, fragment: &str, limit: Option<usize>, json: bool) -> Result<()> {
    render(&engine.search_name(fragment, limit)?, json)
}

pub fn run_range(
    engine: &Engine,
    start: &str,
    end: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let start = parse_date(engine, start)?;
    let end = parse_date(engine, end)?;
    render(&engine.search_date_range(start, end, limit)?, json)
}

pub fn run_filter(
    engine: &Engine,
    criteria: &CriteriaArgs,
    sort_by: Option<CanonicalField>,
    order: Option<SortOrder>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let criteria = criteria.to_criteria(engine)?;
    let page = engine.filter(&criteria, sort_by, order, limit)?;
    if json {
        return print_json(&page);
    }

    print_page(&page.page);
    let summary = &page.summary;
    if summary.total_matched > 0 {
        if let (Some(first), Some(last)) = (summary.earliest_filed, summary.latest_filed) {
            println!("filed: {} .. {}", first, last);
        }
        print_buckets("Top classifications", &summary.top_classifications);
        print_buckets("Top statuses", &summary.top_statuses);
        print_buckets("Top units", &summary.top_responsible_units);
        print_buckets("Top neighborhoods", &summary.top_neighborhoods);
        println!();
    }
    Ok(())
}

fn render(page: &SearchPage, json: bool) -> Result<()> {
    if json {
        return print_json(page);
    }
    print_page(page);
    Ok(())
}
