//! Reader for Excel 2003 XML Spreadsheet (SpreadsheetML) workbooks.
//!
//! Only the first worksheet is read. Cell fills come from the workbook
//! `Styles` section (`Interior ss:Color`), which is what the design legend is
//! keyed on. An `Interior` counts as a fill only with a pattern other than
//! `None`, matching what Excel displays; styles without an `Interior` take it
//! from their `ss:Parent`.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::input::sheet::{SheetCell, SheetGrid, normalize_color};
use crate::input::{InputError, read_text};

pub fn load_spreadsheetml(path: &Path) -> Result<SheetGrid, InputError> {
    let text = read_text(path)?;
    let grid = parse_spreadsheetml(&text)?;
    tracing::debug!(
        path = %path.display(),
        max_row = grid.max_row(),
        max_column = grid.max_column(),
        "design sheet loaded"
    );
    Ok(grid)
}

#[derive(Debug, Default)]
struct StyleDef {
    parent: Option<String>,
    /// `None` when the style has no `Interior` of its own.
    interior: Option<Option<String>>,
}

/// Fill of a style after walking `ss:Parent` links. Cycles end the walk.
fn resolve_fill(styles: &HashMap<String, StyleDef>, id: &str) -> Option<String> {
    let mut current = styles.get(id)?;
    for _ in 0..=styles.len() {
        if let Some(interior) = &current.interior {
            return interior.clone();
        }
        current = styles.get(current.parent.as_deref()?)?;
    }
    None
}

#[derive(Debug, Default)]
struct PendingCell {
    row: usize,
    col: usize,
    fill: Option<String>,
    value: Option<String>,
}

pub fn parse_spreadsheetml(text: &str) -> Result<SheetGrid, InputError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut styles: HashMap<String, StyleDef> = HashMap::new();
    let mut style_id: Option<String> = None;

    let mut grid = SheetGrid::new();
    let mut seen_worksheet = false;
    let mut in_worksheet = false;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut merge_across = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut data: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| InputError::Xml {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"Style" => {
                        style_id = attr(e, b"ID")?;
                        if let Some(id) = &style_id {
                            let def = StyleDef {
                                parent: attr(e, b"Parent")?,
                                interior: None,
                            };
                            styles.insert(id.clone(), def);
                        }
                        if is_empty {
                            style_id = None;
                        }
                    }
                    b"Interior" => {
                        if let Some(def) = style_id.as_ref().and_then(|id| styles.get_mut(id)) {
                            let patterned = attr(e, b"Pattern")?.is_some_and(|p| p != "None");
                            let color = attr(e, b"Color")?.as_deref().and_then(normalize_color);
                            def.interior = Some(color.filter(|_| patterned));
                        }
                    }
                    b"Worksheet" if !seen_worksheet => {
                        seen_worksheet = true;
                        in_worksheet = !is_empty;
                    }
                    b"Row" if in_worksheet => {
                        row = index_attr(e)?.unwrap_or(row + 1);
                        col = 0;
                    }
                    b"Cell" if in_worksheet => {
                        col = index_attr(e)?.unwrap_or(col + 1);
                        merge_across = attr(e, b"MergeAcross")?
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0);
                        let style = attr(e, b"StyleID")?;
                        let fill = resolve_fill(&styles, style.as_deref().unwrap_or("Default"));
                        let pending = PendingCell {
                            row,
                            col,
                            fill,
                            value: None,
                        };
                        if is_empty {
                            commit(&mut grid, pending);
                            col += merge_across;
                        } else {
                            cell = Some(pending);
                        }
                    }
                    b"Data" if cell.is_some() && !is_empty => {
                        data = Some(String::new());
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some(buf) = data.as_mut() {
                    let text = t.unescape().map_err(|e| InputError::Xml {
                        position: reader.buffer_position() as u64,
                        message: e.to_string(),
                    })?;
                    buf.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = data.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Style" => style_id = None,
                b"Data" => {
                    if let (Some(buf), Some(pending)) = (data.take(), cell.as_mut()) {
                        let trimmed = buf.trim();
                        if !trimmed.is_empty() {
                            pending.value = Some(trimmed.to_string());
                        }
                    }
                }
                b"Cell" => {
                    if let Some(pending) = cell.take() {
                        commit(&mut grid, pending);
                    }
                    col += merge_across;
                }
                b"Worksheet" if in_worksheet => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_worksheet {
        return Err(InputError::Parse(
            "design workbook has no Worksheet element".to_string(),
        ));
    }
    Ok(grid)
}

fn commit(grid: &mut SheetGrid, pending: PendingCell) {
    grid.set(
        pending.row,
        pending.col,
        SheetCell {
            value: pending.value,
            fill: pending.fill,
        },
    );
}

/// Attribute lookup by local name, so `ss:Index` and `Index` both match.
pub(crate) fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, InputError> {
    for a in e.attributes() {
        let a = a.map_err(|err| InputError::Parse(format!("bad XML attribute: {err}")))?;
        if a.key.local_name().as_ref() == name {
            let value = a
                .unescape_value()
                .map_err(|err| InputError::Parse(format!("bad XML attribute value: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn index_attr(e: &BytesStart<'_>) -> Result<Option<usize>, InputError> {
    match attr(e, b"Index")? {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| InputError::Parse(format!("invalid ss:Index {v:?}"))),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/spreadsheetml.rs"]
mod tests;
