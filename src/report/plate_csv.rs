use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::InputError;
use crate::input::table::parse_delimited;
use crate::pipeline::PipelineError;
use crate::pipeline::stage1_extract::parse_plate_ct;
use crate::plate::{CtGrid, N_COLS, N_ROWS, ROW_LABELS, WellAddress, WellGrid};
use crate::report::format_f64;

/// Raw Ct dump: a header of column numbers, then one labeled row per plate
/// row. Wells without data are empty fields.
pub fn render_plate_csv(grid: &CtGrid) -> String {
    let mut out = String::new();
    for col in 1..=N_COLS {
        out.push(',');
        out.push_str(&col.to_string());
    }
    out.push('\n');
    for (row, label) in ROW_LABELS.iter().enumerate() {
        out.push(*label);
        for value in grid.row(row) {
            out.push(',');
            if let Some(v) = value {
                out.push_str(&format_f64(*v));
            }
        }
        out.push('\n');
    }
    out
}

pub fn write_plate_csv(grid: &CtGrid, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(render_plate_csv(grid).as_bytes())?;
    w.flush()
}

/// Inverse of `render_plate_csv`. Every filled field must be a finite,
/// positive Ct.
pub fn parse_plate_csv(text: &str) -> Result<CtGrid, PipelineError> {
    let table = parse_delimited(text, ',');
    if table.rows.len() != N_ROWS + 1 {
        return Err(InputError::Parse(format!(
            "plate CSV has {} lines, expected {}",
            table.rows.len(),
            N_ROWS + 1
        ))
        .into());
    }
    let header = &table.rows[0];
    let expected: Vec<String> = (1..=N_COLS).map(|c| c.to_string()).collect();
    if header.len() != N_COLS + 1 || header[1..] != expected[..] {
        return Err(InputError::Parse("plate CSV header must list columns 1..12".to_string()).into());
    }

    let mut values: Vec<Option<f64>> = Vec::with_capacity(N_ROWS * N_COLS);
    for (row, label) in ROW_LABELS.iter().enumerate() {
        let fields = &table.rows[row + 1];
        if fields.first().map(String::as_str) != Some(label.to_string().as_str()) {
            return Err(InputError::Parse(format!(
                "plate CSV line {} should start with row {}",
                row + 2,
                label
            ))
            .into());
        }
        for col in 0..N_COLS {
            let raw = fields.get(col + 1).map(String::as_str).unwrap_or("");
            let well = WellAddress::new(row, col).map(|w| w.to_string()).unwrap_or_default();
            values.push(parse_plate_ct(&well, raw)?);
        }
    }

    Ok(WellGrid::from_fn(|w| values[w.index()]))
}

/// True when the text starts with the header `render_plate_csv` writes.
pub fn is_plate_csv(text: &str) -> bool {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let expected: String = (1..=N_COLS).map(|c| format!(",{c}")).collect();
    header.trim_end_matches('\r').replace(' ', "") == expected
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/plate_csv.rs"]
mod tests;
