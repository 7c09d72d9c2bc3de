//! `pqrs sources`: show which files a load would read, without reading them.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::loader;
use crate::output::print_json;

#[derive(Debug, Serialize)]
struct SourceStatus {
    dir: PathBuf,
    dir_exists: bool,
    spreadsheet: Option<FileStatus>,
    delimited: Option<FileStatus>,
    /// `spreadsheet`, `delimited`, or absent when nothing would load.
    selected: Option<String>,
}

#[derive(Debug, Serialize)]
struct FileStatus {
    path: PathBuf,
    bytes: u64,
}

impl FileStatus {
    fn of(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        }
    }
}

pub fn list_sources(config: &Config, json: bool) -> Result<()> {
    let dir = &config.source.dir;
    let files = match loader::locate(&config.source) {
        Ok(files) => files,
        Err(e) => {
            log::debug!("{}", e);
            loader::SourceFiles::default()
        }
    };

    let status = SourceStatus {
        dir: dir.clone(),
        dir_exists: dir.is_dir(),
        spreadsheet: files.spreadsheet.as_deref().map(FileStatus::of),
        delimited: files.delimited.as_deref().map(FileStatus::of),
        selected: files.preferred().map(|(kind, _)| kind.to_string()),
    };

    if json {
        return print_json(&status);
    }

    println!(
        "{:<12} {:<10} {:>10}  PATH",
        "SOURCE", "STATUS", "SIZE"
    );
    print_row("spreadsheet", status.spreadsheet.as_ref(), status.selected.as_deref());
    print_row("delimited", status.delimited.as_ref(), status.selected.as_deref());
    println!();
    if !status.dir_exists {
        println!("directory {} does not exist", dir.display());
    } else if status.selected.is_none() {
        println!("no usable source in {}", dir.display());
    }
    Ok(())
}

fn print_row(kind: &str, file: Option<&FileStatus>, selected: Option<&str>) {
    match file {
        Some(f) => {
            let state = if selected == Some(kind) { "SELECTED" } else { "FOUND" };
            println!(
                "{:<12} {:<10} {:>10}  {}",
                kind,
                state,
                format_bytes(f.bytes),
                f.path.display()
            );
        }
        None => println!("{:<12} {:<10} {:>10}  -", kind, "MISSING", "-"),
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
