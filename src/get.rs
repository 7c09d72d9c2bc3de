//! Record retrieval by case id (`pqrs get`).

use anyhow::Result;

use crate::engine::Engine;
use crate::output::print_json;

/// Print one record in full. An unknown id prints "not found" and exits 1.
pub fn run_get(engine: &Engine, case_id: &str, json: bool) -> Result<()> {
    let record = match engine.lookup_by_id(case_id) {
        Ok(r) => r,
        Err(e) if e.is_not_found() => {
            eprintln!("not found: {}", case_id.trim());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        return print_json(&record);
    }

    println!("--- Record ---");
    println!("case_id:          {}", record.case_id);
    println!(
        "requester_name:   {}",
        record.requester_name.as_deref().unwrap_or("(anonymous)")
    );
    println!(
        "filed_date:       {}",
        record
            .filed_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "(undated)".to_string())
    );
    let show = |label: &str, v: &Option<String>| {
        if let Some(v) = v {
            println!("{:<18}{}", format!("{}:", label), v);
        }
    };
    show("classification", &record.classification);
    show("status", &record.status);
    show("responsible_unit", &record.responsible_unit);
    show("neighborhood", &record.neighborhood);
    println!();

    if let Some(text) = &record.narrative_text {
        println!("--- Narrative ---");
        println!("{}", text);
        println!();
    }

    if !record.extras.is_empty() {
        println!("--- Other columns ({}) ---", record.extras.len());
        for (header, value) in &record.extras {
            println!("{}: {}", header, value);
        }
        println!();
    }

    Ok(())
}
