//! Source discovery and loading.
//!
//! Looks in the configured directory for the preferred spreadsheet and the
//! delimited fallback, reads whichever applies, and returns a
//! [`RawRowSet`] with provenance.
//!
//! # Fallback rules
//!
//! | Spreadsheet | Delimited | Outcome |
//! |-------------|-----------|---------|
//! | readable | any | spreadsheet is parsed; a parse failure is `SourceCorrupt` |
//! | absent or unreadable | present | delimited file is parsed |
//! | absent or unreadable | absent | `SourceUnavailable` |

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use pqrs_query_core::models::{Provenance, RawRowSet, SourceKind};
use pqrs_query_core::{EngineError, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::SourceConfig;
use crate::{delimited, xlsx};

/// Header plus data rows, every row padded to the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// First row becomes the header; rows are padded to the widest row.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Option<Self> {
        if grid.is_empty() {
            return None;
        }
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, String::new());
        }
        let headers = grid.remove(0);
        Some(Self {
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows: grid,
        })
    }
}

/// The files `load` would read, resolved without reading them.
#[derive(Debug, Clone, Default)]
pub struct SourceFiles {
    pub spreadsheet: Option<PathBuf>,
    pub delimited: Option<PathBuf>,
}

impl SourceFiles {
    /// The file `load` tries first, and its kind.
    pub fn preferred(&self) -> Option<(SourceKind, &Path)> {
        self.spreadsheet
            .as_deref()
            .map(|p| (SourceKind::Spreadsheet, p))
            .or_else(|| self.delimited.as_deref().map(|p| (SourceKind::Delimited, p)))
    }
}

/// Resolve the spreadsheet and delimited candidates in `cfg.dir`.
pub fn locate(cfg: &SourceConfig) -> Result<SourceFiles> {
    if !cfg.dir.is_dir() {
        return Err(EngineError::SourceUnavailable {
            dir: cfg.dir.clone(),
            reason: "directory does not exist".to_string(),
        });
    }
    Ok(SourceFiles {
        spreadsheet: pick(&cfg.dir, cfg.spreadsheet_file.as_deref(), &cfg.spreadsheet_globs)?,
        delimited: pick(&cfg.dir, cfg.delimited_file.as_deref(), &cfg.delimited_globs)?,
    })
}

/// An explicit file name wins; otherwise the first glob match by name.
fn pick(dir: &Path, explicit: Option<&str>, globs: &[String]) -> Result<Option<PathBuf>> {
    if let Some(name) = explicit {
        let path = dir.join(name);
        if path.is_file() {
            return Ok(Some(path));
        }
        log::debug!("configured source file {} not found", path.display());
        return Ok(None);
    }
    if globs.is_empty() {
        return Ok(None);
    }

    let set = build_globset(globs).map_err(|e| EngineError::SourceUnavailable {
        dir: dir.to_path_buf(),
        reason: format!("bad source glob: {}", e),
    })?;

    let found = WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            let name = entry.file_name().to_string_lossy();
            // Office lock files ("~$name.xlsx") are not workbooks.
            !name.starts_with("~$") && set.is_match(name.as_ref())
        })
        .map(|entry| entry.into_path());
    Ok(found)
}

fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

/// Hex SHA-256 of the source bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read the preferred source, falling back to the delimited one.
pub fn load(cfg: &SourceConfig) -> Result<RawRowSet> {
    let files = locate(cfg)?;

    if let Some(path) = &files.spreadsheet {
        match std::fs::read(path) {
            Ok(bytes) => {
                let table = xlsx::read_workbook(path, &bytes, cfg.sheet.as_deref())?;
                return Ok(row_set(SourceKind::Spreadsheet, path, &bytes, table));
            }
            Err(e) => {
                log::warn!(
                    "spreadsheet {} is unreadable ({}); falling back to delimited source",
                    path.display(),
                    e
                );
            }
        }
    }

    if let Some(path) = &files.delimited {
        let bytes = std::fs::read(path).map_err(|e| EngineError::SourceUnavailable {
            dir: cfg.dir.clone(),
            reason: format!("{}: {}", path.display(), e),
        })?;
        let table = delimited::read_delimited(path, &bytes, cfg.delimiter)?;
        return Ok(row_set(SourceKind::Delimited, path, &bytes, table));
    }

    Err(EngineError::SourceUnavailable {
        dir: cfg.dir.clone(),
        reason: "no readable spreadsheet or delimited file found".to_string(),
    })
}

fn row_set(kind: SourceKind, path: &Path, bytes: &[u8], table: Table) -> RawRowSet {
    log::info!(
        "read {} source {} ({} rows, {} columns)",
        kind,
        path.display(),
        table.rows.len(),
        table.headers.len()
    );
    RawRowSet {
        provenance: Provenance {
            source_kind: kind,
            path: path.to_path_buf(),
            row_count: table.rows.len(),
            fingerprint: fingerprint(bytes),
        },
        headers: table.headers,
        rows: table.rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn source(dir: &Path) -> SourceConfig {
        Config::for_dir(dir).source
    }

    #[test]
    fn grid_is_padded_to_widest_row() {
        let t = Table::from_grid(vec![
            vec!["a".into(), " b ".into()],
            vec!["1".into()],
            vec!["1".into(), "2".into(), "3".into()],
        ])
        .unwrap();
        assert_eq!(t.headers, vec!["a", "b", ""]);
        assert_eq!(t.rows[0], vec!["1", "", ""]);
        assert!(Table::from_grid(Vec::new()).is_none());
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = load(&source(&tmp.path().join("nope"))).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }

    #[test]
    fn empty_directory_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = load(&source(tmp.path())).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }

    #[test]
    fn delimited_file_is_used_without_spreadsheet() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("historico.csv"), "radicado;estado\n2024-1;Pendiente\n").unwrap();
        let raw = load(&source(tmp.path())).unwrap();
        assert_eq!(raw.provenance.source_kind, SourceKind::Delimited);
        assert_eq!(raw.row_count(), 1);
        assert_eq!(raw.provenance.fingerprint.len(), 64);
    }

    #[test]
    fn corrupt_spreadsheet_does_not_fall_back() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("historico.xlsx"), b"garbage").unwrap();
        fs::write(tmp.path().join("historico.csv"), "radicado\n1\n").unwrap();
        let err = load(&source(tmp.path())).unwrap_err();
        assert!(matches!(err, EngineError::SourceCorrupt { .. }));
    }

    #[test]
    fn lock_files_and_explicit_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("~$historico.xlsx"), b"lock").unwrap();
        fs::write(tmp.path().join("b.csv"), "x\n").unwrap();
        fs::write(tmp.path().join("a.csv"), "x\n").unwrap();

        let files = locate(&source(tmp.path())).unwrap();
        assert!(files.spreadsheet.is_none());
        assert_eq!(files.delimited.unwrap().file_name().unwrap(), "a.csv");

        let mut cfg = source(tmp.path());
        cfg.delimited_file = Some("b.csv".into());
        let files = locate(&cfg).unwrap();
        assert_eq!(files.delimited.unwrap().file_name().unwrap(), "b.csv");
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
