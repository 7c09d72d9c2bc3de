//! Export filter results as JSON or CSV (`pqrs export`).
//!
//! Writes every matching record, in load order and without a limit, to a
//! file or to stdout for piping. CSV output has the canonical columns
//! first, then every extra column seen in the exported records.

use anyhow::Result;
use clap::ValueEnum;
use pqrs_query_core::models::{CanonicalField, Record};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::engine::Engine;
use crate::search::CriteriaArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Serialize)]
struct ExportData<'a> {
    generation_id: u64,
    count: usize,
    records: &'a [Record],
}

pub fn run_export(
    engine: &Engine,
    criteria: &CriteriaArgs,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let criteria = criteria.to_criteria(engine)?;
    let page = engine.matching(&criteria)?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(std::io::BufWriter::new(std::fs::File::create(path)?))
        }
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        ExportFormat::Json => {
            let data = ExportData {
                generation_id: page.generation_id,
                count: page.records.len(),
                records: &page.records,
            };
            serde_json::to_writer_pretty(&mut out, &data)?;
            writeln!(out)?;
        }
        ExportFormat::Csv => write_csv(&mut out, &page.records)?,
    }
    out.flush()?;

    if let Some(path) = output {
        eprintln!("Exported {} records to {}", page.records.len(), path.display());
    }
    Ok(())
}

fn write_csv<W: Write>(out: W, records: &[Record]) -> Result<()> {
    let extras: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extras.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    let header = CanonicalField::ALL
        .iter()
        .map(|f| f.as_str())
        .chain(extras.iter().copied());
    writer.write_record(header)?;

    for record in records {
        let canonical = CanonicalField::ALL
            .iter()
            .map(|&f| record.text(f).unwrap_or_default());
        let extra = extras
            .iter()
            .map(|&k| record.extras.get(k).cloned().unwrap_or_default());
        writer.write_record(canonical.chain(extra))?;
    }
    writer.flush()?;
    Ok(())
}
