//! Reader for Office Open XML workbooks (`.xlsx`).
//!
//! Builds the same `SheetGrid` as the SpreadsheetML reader from the first
//! worksheet. Cell fills are the foreground color of the cell format's
//! pattern fill in `xl/styles.xml`.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::input::InputError;
use crate::input::sheet::{SheetCell, SheetGrid, normalize_color};
use crate::input::spreadsheetml::attr;

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const STYLES: &str = "xl/styles.xml";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

pub fn load_xlsx(path: &Path) -> Result<SheetGrid, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    let grid = read_xlsx(BufReader::new(File::open(path)?))?;
    tracing::debug!(
        path = %path.display(),
        max_row = grid.max_row(),
        max_column = grid.max_column(),
        "design workbook loaded"
    );
    Ok(grid)
}

pub fn read_xlsx<R: Read + Seek>(reader: R) -> Result<SheetGrid, InputError> {
    let mut archive = ZipArchive::new(reader)?;
    let sheet_path = first_sheet_path(&mut archive)?;
    let fills = match read_entry(&mut archive, STYLES)? {
        Some(xml) => parse_format_fills(&xml)?,
        None => Vec::new(),
    };
    let shared = match read_entry(&mut archive, SHARED_STRINGS)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let sheet = read_entry(&mut archive, &sheet_path)?
        .ok_or_else(|| InputError::Parse(format!("xlsx worksheet part {sheet_path} is missing")))?;
    parse_worksheet(&sheet, &shared, &fills)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, InputError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Part name of the first sheet listed in the workbook. Falls back to the
/// lowest-numbered `xl/worksheets/*.xml` when the workbook part or its
/// relationships are absent.
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, InputError> {
    let rel_id = match read_entry(archive, WORKBOOK)? {
        Some(xml) => first_sheet_rel_id(&xml)?,
        None => None,
    };
    if let Some(id) = rel_id {
        if let Some(rels) = read_entry(archive, WORKBOOK_RELS)? {
            if let Some(target) = relationship_target(&rels, &id)? {
                return Ok(part_name(&target));
            }
        }
    }

    let mut sheets: Vec<&str> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml"))
        .collect();
    sheets.sort_by_key(|n| (n.len(), *n));
    sheets
        .first()
        .map(|n| n.to_string())
        .ok_or_else(|| InputError::Parse("xlsx workbook has no worksheet".to_string()))
}

/// Relationship targets are relative to `xl/` unless absolute.
fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, InputError> {
    reader.read_event().map_err(|e| InputError::Xml {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    })
}

fn text_of(reader: &Reader<&[u8]>, t: &quick_xml::events::BytesText<'_>) -> Result<String, InputError> {
    t.unescape().map(|c| c.into_owned()).map_err(|e| InputError::Xml {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    })
}

fn first_sheet_rel_id(xml: &str) -> Result<Option<String>, InputError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return attr(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn relationship_target(xml: &str, id: &str) -> Result<Option<String>, InputError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match next_event(&mut reader)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(&e, b"Id")?.as_deref() == Some(id) {
                    return attr(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Fill color per cell format (`cellXfs` index). Only pattern fills with a
/// pattern other than `none` count; `gray125` and friends carry no
/// foreground color and stay unfilled.
fn parse_format_fills(xml: &str) -> Result<Vec<Option<String>>, InputError> {
    let mut reader = Reader::from_str(xml);
    let mut fills: Vec<Option<String>> = Vec::new();
    let mut formats: Vec<Option<String>> = Vec::new();
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut patterned = false;

    loop {
        let event = next_event(&mut reader)?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"fills" => in_fills = !is_empty,
                    b"cellXfs" => in_cell_xfs = !is_empty,
                    b"fill" if in_fills => {
                        fills.push(None);
                        patterned = false;
                    }
                    b"patternFill" if in_fills => {
                        patterned = attr(e, b"patternType")?.is_some_and(|p| p != "none");
                    }
                    b"fgColor" if in_fills && patterned => {
                        if let Some(slot) = fills.last_mut() {
                            *slot = color_token(e)?;
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let fill_id = attr(e, b"fillId")?
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        formats.push(fills.get(fill_id).cloned().flatten());
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(formats)
}

fn color_token(e: &BytesStart<'_>) -> Result<Option<String>, InputError> {
    if let Some(rgb) = attr(e, b"rgb")? {
        return Ok(normalize_color(&rgb));
    }
    if let Some(theme) = attr(e, b"theme")? {
        return Ok(Some(match attr(e, b"tint")? {
            Some(tint) => format!("theme:{theme}:{tint}"),
            None => format!("theme:{theme}"),
        }));
    }
    Ok(attr(e, b"indexed")?.map(|i| format!("indexed:{i}")))
}

/// Plain text of each `<si>` item. Phonetic runs (`rPh`) are skipped.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, InputError> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match next_event(&mut reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => out.push(String::new()),
            Event::Text(t) => {
                if in_text && !in_phonetic {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(&text_of(&reader, &t)?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => out.extend(current.take()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// `"AB12"` to 1-based (row 12, column 28).
fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    let row = digits.parse::<usize>().ok().filter(|&r| r > 0)?;
    Some((row, col))
}

#[derive(Debug, Default)]
struct PendingCell {
    row: usize,
    col: usize,
    kind: Option<String>,
    fill: Option<String>,
    raw: String,
}

fn parse_worksheet(
    xml: &str,
    shared: &[String],
    fills: &[Option<String>],
) -> Result<SheetGrid, InputError> {
    let mut reader = Reader::from_str(xml);
    let mut grid = SheetGrid::new();
    let mut row = 0usize;
    let mut col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_phonetic = false;

    loop {
        let event = next_event(&mut reader)?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        row = attr(e, b"r")?
                            .and_then(|r| r.trim().parse().ok())
                            .unwrap_or(row + 1);
                        col = 0;
                    }
                    b"c" => {
                        (row, col) = match attr(e, b"r")? {
                            Some(r) => parse_cell_ref(&r).ok_or_else(|| {
                                InputError::Parse(format!("invalid xlsx cell reference {r:?}"))
                            })?,
                            None => (row, col + 1),
                        };
                        let fill = attr(e, b"s")?
                            .and_then(|s| s.trim().parse::<usize>().ok())
                            .and_then(|s| fills.get(s).cloned().flatten());
                        let pending = PendingCell {
                            row,
                            col,
                            kind: attr(e, b"t")?,
                            fill,
                            raw: String::new(),
                        };
                        if is_empty {
                            commit(&mut grid, pending, shared)?;
                        } else {
                            cell = Some(pending);
                        }
                    }
                    b"v" | b"t" if cell.is_some() && !is_empty => in_value = true,
                    b"rPh" if !is_empty => in_phonetic = true,
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_value && !in_phonetic {
                    if let Some(pending) = cell.as_mut() {
                        pending.raw.push_str(&text_of(&reader, t)?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        commit(&mut grid, pending, shared)?;
                    }
                }
                b"sheetData" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(grid)
}

fn commit(grid: &mut SheetGrid, pending: PendingCell, shared: &[String]) -> Result<(), InputError> {
    let raw = pending.raw.trim();
    let value = match pending.kind.as_deref() {
        _ if raw.is_empty() => None,
        Some("s") => {
            let idx: usize = raw
                .parse()
                .map_err(|_| InputError::Parse(format!("invalid shared string index {raw:?}")))?;
            let text = shared.get(idx).ok_or_else(|| {
                InputError::Parse(format!("shared string index {idx} out of range"))
            })?;
            Some(text.trim().to_string()).filter(|t| !t.is_empty())
        }
        Some("b") => Some(if raw == "1" { "TRUE" } else { "FALSE" }.to_string()),
        _ => Some(raw.to_string()),
    };
    grid.set(
        pending.row,
        pending.col,
        SheetCell {
            value,
            fill: pending.fill,
        },
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/xlsx.rs"]
mod tests;
