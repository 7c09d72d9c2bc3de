//! # PQRS Query CLI (`pqrs`)
//!
//! The `pqrs` binary loads the configured PQRS export and answers
//! requests against it.
//!
//! ## Usage
//!
//! ```bash
//! pqrs --config ./config/pqrs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pqrs sources` | Show which source file would be loaded |
//! | `pqrs help-queries` | Request forms, filter criteria and sort fields |
//! | `pqrs load` | Load the source and report data-quality issues |
//! | `pqrs query "<text>"` | Classify a natural-language request and answer it |
//! | `pqrs get <case_id>` | Print one record in full |
//! | `pqrs text "<words>"` | Free-text search over the narrative |
//! | `pqrs name "<fragment>"` | Requester-name search |
//! | `pqrs range <start> <end>` | Records filed within a date range |
//! | `pqrs filter [criteria]` | Combined filter with sorting |
//! | `pqrs stats [criteria]` | Counts by status, classification, period |
//! | `pqrs suggest <fragment>` | Category values containing a fragment |
//! | `pqrs export --format json\|csv` | Write matching records to a file |
//!
//! ## Examples
//!
//! ```bash
//! pqrs query "2024-00451"
//! pqrs query "quejas entre 01/01/2024 y 31/03/2024"
//! pqrs filter --status pendiente --from 2024-01-01 --sort-by case_id --order asc
//! pqrs export --classification queja --format csv --output quejas.csv
//! ```

use clap::{Parser, Subcommand};
use pqrs_query::config::load_config;
use pqrs_query::export::ExportFormat;
use pqrs_query::search::CriteriaArgs;
use pqrs_query::{export, get, help, ingest, search, sources, stats, Engine};
use pqrs_query_core::classify::Strategy;
use pqrs_query_core::models::CanonicalField;
use pqrs_query_core::search::SortOrder;
use std::path::PathBuf;

/// PQRS Query: search and statistics over historical citizen-request records.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pqrs.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pqrs",
    about = "PQRS Query: search and statistics over historical citizen-request records",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pqrs.toml")]
    config: PathBuf,

    /// Print structured results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Debug-level logging on stderr.
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured directory and which file a load would read.
    Sources,

    /// Describe the request forms, filter criteria and sort fields.
    HelpQueries,

    /// Load (or reload) the source and report the outcome.
    Load,

    /// Classify a natural-language request and run the chosen strategy.
    Query {
        text: String,

        /// Skip classification: exact_lookup, free_text, name_match,
        /// date_range, combined, aggregate or help.
        #[arg(long)]
        hint: Option<Strategy>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one record by case id.
    Get { case_id: String },

    /// Free-text search over the narrative (and categories).
    Text {
        text: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search by requester name.
    Name {
        fragment: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Records filed within [start, end], inclusive.
    Range {
        start: String,
        end: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Combined filter; every given criterion must hold.
    Filter {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// Attribute to sort by (default filed_date).
        #[arg(long)]
        sort_by: Option<CanonicalField>,

        /// asc or desc (default desc).
        #[arg(long)]
        order: Option<SortOrder>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Statistics over all records or over those matching the criteria.
    Stats {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Category values (classification, status, unit) containing a fragment.
    Suggest { fragment: String },

    /// Write every record matching the criteria as JSON or CSV.
    Export {
        #[command(flatten)]
        criteria: CriteriaArgs,

        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file; stdout when absent.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Commands::HelpQueries = cli.command {
        return help::run_help_queries(cli.json);
    }

    let cfg = load_config(&cli.config)?;
    let json = cli.json;

    // Listing sources must work even when nothing would load.
    if let Commands::Sources = cli.command {
        return sources::list_sources(&cfg, json);
    }

    let engine = Engine::new(cfg)?;

    match cli.command {
        Commands::Sources | Commands::HelpQueries => {}
        Commands::Load => ingest::run_load(&engine, json)?,
        Commands::Query { text, hint, limit } => {
            search::run_query(&engine, &text, hint, limit, json)?
        }
        Commands::Get { case_id } => get::run_get(&engine, &case_id, json)?,
        Commands::Text { text, limit } => search::run_text(&engine, &text, limit, json)?,
        Commands::Name { fragment, limit } => search::run_name(&engine, &fragment, limit, json)?,
        Commands::Range { start, end, limit } => {
            search::run_range(&engine, &start, &end, limit, json)?
        }
        Commands::Filter {
            criteria,
            sort_by,
            order,
            limit,
        } => search::run_filter(&engine, &criteria, sort_by, order, limit, json)?,
        Commands::Stats { criteria } => stats::run_stats(&engine, &criteria, json)?,
        Commands::Suggest { fragment } => {
            let suggestions = engine.suggest(&fragment)?;
            if json {
                pqrs_query::output::print_json(&suggestions)?;
            } else if suggestions.is_empty() {
                println!("No suggestions.");
            } else {
                for s in &suggestions {
                    println!("{}", s);
                }
            }
        }
        Commands::Export {
            criteria,
            format,
            output,
        } => export::run_export(&engine, &criteria, format, output.as_deref())?,
    }

    Ok(())
}
