//! `pqrs load`: read the source, publish a generation, report what happened.

use anyhow::Result;

use crate::engine::Engine;
use crate::output::print_json;

pub fn run_load(engine: &Engine, json: bool) -> Result<()> {
    let report = engine.load_or_reload()?;
    if json {
        return print_json(&report);
    }

    println!("load {}", report.source_path.display());
    println!("  source kind: {}", report.source_kind);
    println!("  rows read: {}", report.row_count);
    println!("  records: {}", report.record_count);
    println!("  generation: {}", report.generation_id);
    println!("  fingerprint: {}", report.fingerprint);
    if report.unchanged {
        println!("  source unchanged since previous load");
    }
    if !report.issues.is_empty() {
        println!("  data-quality issues: {}", report.issues.len());
        for issue in &report.issues {
            println!("    - {}", issue);
        }
    }
    println!("ok");
    Ok(())
}
