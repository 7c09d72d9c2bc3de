//! Delimited text export reader (`;`, `,`, tab or `|` separated).
//!
//! Exports from the records office arrive in whatever encoding the
//! exporting tool used, so each field is decoded as UTF-8 and falls back
//! to Windows-1252 (the Latin-1 superset office tools write) when that
//! fails. A row whose field count differs from the
//! header makes the whole file `SourceCorrupt`.

use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use encoding_rs::WINDOWS_1252;
use pqrs_query_core::{EngineError, Result};

use crate::loader::Table;

const CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse `bytes` as a delimited table with a header row.
///
/// `delimiter` overrides detection; it must be ASCII (checked by config).
pub fn read_delimited(path: &Path, bytes: &[u8], delimiter: Option<char>) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => {
            return Err(EngineError::validation(format!(
                "delimiter '{}' is not a single-byte character",
                c
            )))
        }
        None => detect_delimiter(bytes),
    };
    log::debug!("reading {} with delimiter {:?}", path.display(), delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers = reader
        .byte_headers()
        .map_err(|e| EngineError::corrupt(path, e))?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EngineError::corrupt(path, "missing header row"));
    }

    let mut grid = vec![decode_record(&headers)];
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                let row = decode_record(&record);
                if row.iter().any(|v| !v.trim().is_empty()) {
                    grid.push(row);
                }
            }
            Ok(false) => break,
            Err(e) => return Err(EngineError::corrupt(path, e)),
        }
    }

    Table::from_grid(grid).ok_or_else(|| EngineError::corrupt(path, "empty file"))
}

fn decode_record(record: &ByteRecord) -> Vec<String> {
    record.iter().map(decode_field).collect()
}

fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(s) => s.to_string(),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(field).0.into_owned(),
    }
}

/// Pick the candidate that occurs most often (outside quotes) in the header
/// line. Ties go to the earlier candidate; `,` when none occurs.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let line_end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    let line = &bytes[..line_end];

    let mut counts = [0usize; CANDIDATES.len()];
    let mut quoted = false;
    for &b in line {
        if b == b'"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(i) = CANDIDATES.iter().position(|&c| c == b) {
                counts[i] += 1;
            }
        }
    }

    let mut best = None;
    for (i, &n) in counts.iter().enumerate() {
        if n > 0 && best.map_or(true, |(_, m)| n > m) {
            best = Some((i, n));
        }
    }
    best.map(|(i, _)| CANDIDATES[i]).unwrap_or(b',')
}
