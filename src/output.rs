//! Human-readable and JSON rendering shared by the CLI commands.

use anyhow::Result;
use pqrs_query_core::aggregate::Bucket;
use pqrs_query_core::models::Record;
use serde::Serialize;

use crate::engine::SearchPage;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Numbered record list followed by the truncation note, if any.
pub fn print_page(page: &SearchPage) {
    if page.records.is_empty() {
        println!("No results.");
        return;
    }
    for (i, record) in page.records.iter().enumerate() {
        print_record_summary(i + 1, record);
    }
    if page.is_truncated() {
        println!(
            "showing {} of {} matches (use --limit to see more)",
            page.records.len(),
            page.matched_count
        );
    } else {
        println!("{} matches", page.matched_count);
    }
}

pub fn print_record_summary(n: usize, record: &Record) {
    let date = record
        .filed_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "(undated)".to_string());
    println!(
        "{}. {} [{}] {}",
        n,
        record.case_id,
        date,
        record.requester_name.as_deref().unwrap_or("(anonymous)")
    );
    if let Some(class) = &record.classification {
        println!("    classification: {}", class);
    }
    if let Some(status) = &record.status {
        println!("    status: {}", status);
    }
    if let Some(unit) = &record.responsible_unit {
        println!("    unit: {}", unit);
    }
    if let Some(text) = &record.narrative_text {
        println!("    excerpt: \"{}\"", excerpt(text, 160));
    }
    println!();
}

/// First `max_chars` characters of `text` on one line.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

pub fn print_buckets(title: &str, buckets: &[Bucket]) {
    if buckets.is_empty() {
        return;
    }
    println!();
    println!("  {}:", title);
    for b in buckets {
        println!("    {:<40} {:>6}", b.key, b.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_flattens_and_truncates() {
        assert_eq!(excerpt("a\n  b", 10), "a b");
        assert_eq!(excerpt("reparación", 4), "repa…");
    }
}
