//! Query guide (`pqrs help-queries`, or `pqrs query ayuda`).

use anyhow::Result;
use pqrs_query_core::help::{query_help, QueryHelp};

use crate::output::print_json;

/// Print the guide; needs no configuration or data.
pub fn run_help_queries(json: bool) -> Result<()> {
    let help = query_help();
    if json {
        return print_json(&help);
    }
    print_query_help(&help);
    Ok(())
}

pub fn print_query_help(help: &QueryHelp) {
    println!("PQRS Query: Requests");
    println!("====================");
    println!();
    println!("  Strategies:");
    for s in &help.strategies {
        println!("    {:<14} {}", s.strategy.as_str(), s.description);
        println!("    {:<14} e.g. {}", "", s.example);
    }

    println!();
    println!("  Filter criteria (filter, stats, export):");
    for c in &help.filter_criteria {
        println!("    {:<18} {}", c.name, c.description);
    }

    println!();
    println!("  Sort fields: {}", help.sort_fields.join(", "));

    println!();
    println!("  Examples:");
    for e in &help.examples {
        println!("    {}", e);
    }
    println!();
}
