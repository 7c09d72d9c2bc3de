//! # PQRS Query
//!
//! A query engine over historical PQRS records (petitions, complaints,
//! claims, suggestions and reports filed by citizens).
//!
//! Records are read from a spreadsheet export, or from a delimited text
//! export when no spreadsheet is usable, normalized onto a fixed set of
//! canonical attributes, and published as an immutable generation. Natural
//! language requests are classified into a retrieval strategy and answered
//! from that generation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │ xlsx / csv   │──▶│ Normalizer │──▶│ RecordStore  │
//! │   loader     │   │ (synonyms) │   │ (generation) │
//! └──────────────┘   └────────────┘   └──────┬───────┘
//!                                            │
//!                    ┌───────────────────────┤
//!                    ▼                       ▼
//!              ┌────────────┐         ┌────────────┐
//!              │ Classifier │────────▶│ Strategies │
//!              └────────────┘         └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | Source discovery, fallback and fingerprinting |
//! | [`xlsx`] | Spreadsheet (OOXML) reader |
//! | [`delimited`] | Delimited text reader |
//! | [`engine`] | Load/reload and every query operation |
//! | [`search`], [`get`], [`stats`], [`sources`], [`ingest`], [`export`] | CLI commands |
//!
//! The I/O-free logic lives in the `pqrs-query-core` crate.

pub mod config;
pub mod delimited;
pub mod engine;
pub mod export;
pub mod get;
pub mod help;
pub mod ingest;
pub mod loader;
pub mod output;
pub mod search;
pub mod sources;
pub mod stats;
pub mod xlsx;

pub use engine::Engine;
