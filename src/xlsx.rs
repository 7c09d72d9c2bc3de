//! Worksheet reader for `.xlsx` workbooks.
//!
//! Reads one worksheet into a [`Table`]: the first non-empty row is the
//! header, every later non-empty row is a data row. Cells are addressed by
//! their `r` reference so sparse rows land in the right column.
//!
//! Any structural problem (not a zip, missing worksheet, bad XML, shared
//! string index out of range, cell reference past column `XFD`) is
//! [`EngineError::SourceCorrupt`]; nothing is skipped silently.

use std::io::{Cursor, Read};
use std::path::Path;

use pqrs_query_core::{EngineError, Result};
use quick_xml::events::{BytesStart, Event};

use crate::loader::Table;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 200 * 1024 * 1024;

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// Read worksheet `sheet` (or the first one) from workbook bytes.
pub fn read_workbook(path: &Path, bytes: &[u8], sheet: Option<&str>) -> Result<Table> {
    let corrupt = |e: &dyn std::fmt::Display| EngineError::corrupt(path, e);

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(&e))?;
    let sheets = list_sheets(&mut archive).map_err(|e| corrupt(&e))?;

    let (name, entry) = match sheet {
        Some(wanted) => sheets
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted.trim()))
            .ok_or_else(|| {
                let available: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
                corrupt(&format!(
                    "worksheet '{}' not found (available: {})",
                    wanted,
                    available.join(", ")
                ))
            })?,
        None => sheets
            .first()
            .ok_or_else(|| corrupt(&"workbook contains no worksheets"))?,
    };
    log::debug!("reading worksheet '{}' ({})", name, entry);

    let shared = if archive.file_names().any(|n| n == SHARED_STRINGS) {
        let xml = read_zip_entry_bounded(&mut archive, SHARED_STRINGS).map_err(|e| corrupt(&e))?;
        read_shared_strings(&xml).map_err(|e| corrupt(&e))?
    } else {
        Vec::new()
    };

    let xml = read_zip_entry_bounded(&mut archive, entry).map_err(|e| corrupt(&e))?;
    let grid = read_sheet_rows(&xml, &shared).map_err(|e| corrupt(&e))?;
    Table::from_grid(grid).ok_or_else(|| corrupt(&"worksheet has no header row"))
}

fn read_zip_entry_bounded(archive: &mut Archive<'_>, name: &str) -> std::result::Result<Vec<u8>, String> {
    let entry = archive.by_name(name).map_err(|e| format!("{}: {}", name, e))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| format!("{}: {}", name, e))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        ));
    }
    Ok(out)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `(sheet name, zip entry)` in workbook order.
///
/// Uses the workbook and its relationships when present; otherwise falls
/// back to the `sheetN.xml` entries sorted by number.
fn list_sheets(archive: &mut Archive<'_>) -> std::result::Result<Vec<(String, String)>, String> {
    let entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    if entries.iter().any(|n| n == WORKBOOK) && entries.iter().any(|n| n == WORKBOOK_RELS) {
        let workbook = read_zip_entry_bounded(archive, WORKBOOK)?;
        let rels = read_zip_entry_bounded(archive, WORKBOOK_RELS)?;
        let targets = read_relationships(&rels)?;
        let mut sheets = Vec::new();
        for (name, rel_id) in read_sheet_refs(&workbook)? {
            if let Some((_, target)) = targets.iter().find(|(id, _)| *id == rel_id) {
                sheets.push((name, resolve_target(target)));
            }
        }
        if !sheets.is_empty() {
            return Ok(sheets);
        }
    }

    let mut names: Vec<String> = entries
        .into_iter()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    Ok(names
        .into_iter()
        .map(|entry| {
            let name = entry
                .trim_start_matches("xl/worksheets/")
                .trim_end_matches(".xml")
                .to_string();
            (name, entry)
        })
        .collect())
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn read_sheet_refs(xml: &[u8]) -> std::result::Result<Vec<(String, String)>, String> {
    let mut refs = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attr(&e, b"name"), attr(&e, b"id")) {
                    refs.push((name, id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{}: {}", WORKBOOK, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(refs)
}

fn read_relationships(xml: &[u8]) -> std::result::Result<Vec<(String, String)>, String> {
    let mut rels = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    rels.push((id, target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{}: {}", WORKBOOK_RELS, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// One string per `<si>`, rich-text runs concatenated.
fn read_shared_strings(xml: &[u8]) -> std::result::Result<Vec<String>, String> {
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    // Phonetic runs (<rPh>) carry reading hints, not cell text.
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = current.is_some(),
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(te)) if in_t && !in_phonetic => {
                let text = te.unescape().map_err(|e| e.to_string())?;
                if let Some(s) = current.as_mut() {
                    s.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{}: {}", SHARED_STRINGS, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Widest sheet the format allows (column `XFD`).
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column of a cell reference such as `"AB12"`; `None` when the
/// reference has no column letters.
fn column_index(cell_ref: &str) -> std::result::Result<Option<usize>, String> {
    let letters = cell_ref.bytes().take_while(|b| b.is_ascii_alphabetic());
    let mut col = 0usize;
    for b in letters {
        let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .filter(|&c| c <= MAX_COLUMNS)
            .ok_or_else(|| format!("bad cell reference '{}'", cell_ref))?;
    }
    Ok(col.checked_sub(1))
}

/// Column of a `<c>` element: its `r` reference, else the next free column.
fn cell_column(e: &BytesStart, next_col: usize) -> std::result::Result<usize, String> {
    let col = match attr(e, b"r") {
        Some(r) => column_index(&r)?.unwrap_or(next_col),
        None => next_col,
    };
    if col >= MAX_COLUMNS {
        return Err(format!("cell beyond column limit ({})", MAX_COLUMNS));
    }
    Ok(col)
}

#[derive(Default)]
struct Cell {
    col: usize,
    kind: Option<String>,
    raw: String,
}

fn cell_value(cell: Cell, shared: &[String]) -> std::result::Result<String, String> {
    match cell.kind.as_deref() {
        Some("s") => {
            let raw = cell.raw.trim();
            if raw.is_empty() {
                return Ok(String::new());
            }
            let idx: usize = raw
                .parse()
                .map_err(|_| format!("bad shared string index '{}'", raw))?;
            shared
                .get(idx)
                .cloned()
                .ok_or_else(|| format!("shared string index {} out of range", idx))
        }
        Some("b") => Ok(match cell.raw.trim() {
            "1" => "TRUE".to_string(),
            "0" => "FALSE".to_string(),
            other => other.to_string(),
        }),
        _ => Ok(cell.raw),
    }
}

/// Rows of cell text, with empty rows dropped.
fn read_sheet_rows(xml: &[u8], shared: &[String]) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<Cell> = None;
    let mut next_col = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = Some(Vec::new());
                    next_col = 0;
                }
                b"c" => {
                    let col = cell_column(&e, next_col)?;
                    cell = Some(Cell {
                        col,
                        kind: attr(&e, b"t"),
                        raw: String::new(),
                    });
                }
                b"v" | b"t" => in_text = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"c" => {
                    next_col = cell_column(&e, next_col)? + 1;
                }
                b"row" => next_col = 0,
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| e.to_string())?;
                if let Some(c) = cell.as_mut() {
                    c.raw.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_text = false,
                b"c" => {
                    if let Some(c) = cell.take() {
                        let col = c.col;
                        let value = cell_value(c, shared)?;
                        if let Some(r) = row.as_mut() {
                            if r.len() <= col {
                                r.resize(col + 1, String::new());
                            }
                            r[col] = value;
                        }
                        next_col = col + 1;
                    }
                }
                b"row" => {
                    if let Some(r) = row.take().filter(|r| r.iter().any(|v| !v.trim().is_empty())) {
                        rows.push(r);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("worksheet XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_map_to_indexes() {
        assert_eq!(column_index("A1"), Ok(Some(0)));
        assert_eq!(column_index("Z9"), Ok(Some(25)));
        assert_eq!(column_index("AA10"), Ok(Some(26)));
        assert_eq!(column_index("ab3"), Ok(Some(27)));
        assert_eq!(column_index("XFD1"), Ok(Some(16_383)));
        assert_eq!(column_index("12"), Ok(None));
    }

    #[test]
    fn rich_text_shared_strings_are_joined() {
        let xml = br#"<sst><si><t>Plain</t></si><si><r><t>Rich </t></r><r><t>text</t></r></si><si/></sst>"#;
        assert_eq!(
            read_shared_strings(xml).unwrap(),
            vec!["Plain".to_string(), "Rich text".to_string(), String::new()]
        );
    }

    #[test]
    fn sparse_rows_keep_their_columns() {
        let xml = br#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="inlineStr"><is><t>estado</t></is></c></row>
            <row r="2"><c r="A2"><v>45306</v></c><c r="C2" t="b"><v>1</v></c></row>
            <row r="3"><c r="B3" t="s"/></row>
        </sheetData></worksheet>"#;
        let shared = vec!["radicado".to_string()];
        let rows = read_sheet_rows(xml, &shared).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["radicado", "", "estado"]);
        assert_eq!(rows[1], vec!["45306", "", "TRUE"]);
    }

    #[test]
    fn out_of_range_shared_string_is_an_error() {
        let xml = br#"<worksheet><sheetData><row><c t="s"><v>3</v></c></row></sheetData></worksheet>"#;
        assert!(read_sheet_rows(xml, &[]).is_err());
    }

    #[test]
    fn oversized_cell_references_are_errors() {
        assert!(column_index("XFE1").is_err());
        assert!(column_index("XFDXFD1").is_err());
        assert!(column_index("ZZZZZZZZZZZZZZ1").is_err());

        let xml = br#"<worksheet><sheetData><row><c r="ZZZZZZZZZZZZZZ1"><v>1</v></c></row></sheetData></worksheet>"#;
        let err = read_sheet_rows(xml, &[]).unwrap_err();
        assert!(err.contains("bad cell reference"));

        let xml = br#"<worksheet><sheetData><row><c r="XFDXFD1"/></row></sheetData></worksheet>"#;
        assert!(read_sheet_rows(xml, &[]).is_err());
    }

    #[test]
    fn non_zip_bytes_are_corrupt() {
        let err = read_workbook(Path::new("h.xlsx"), b"not a zip", None).unwrap_err();
        assert!(matches!(err, EngineError::SourceCorrupt { .. }));
    }
}
