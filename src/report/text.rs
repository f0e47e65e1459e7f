use crate::model::results::{KNOCKDOWN_COLUMNS, KnockdownRow};
use crate::plate::{CtGrid, N_COLS, ROW_LABELS};
use crate::report::format_ct;
use crate::report::tsv::knockdown_fields;

pub fn render_plate_text(grid: &CtGrid) -> String {
    let mut out = String::new();
    out.push_str("   ");
    for col in 1..=N_COLS {
        out.push_str(&format!("{:>7}", col));
    }
    out.push('\n');
    for (row, label) in ROW_LABELS.iter().enumerate() {
        out.push_str(&format!("{:<3}", label));
        for value in grid.row(row) {
            out.push_str(&format!("{:>7}", format_ct(*value)));
        }
        out.push('\n');
    }
    out
}

pub fn render_knockdown_text(rows: &[KnockdownRow]) -> String {
    let body: Vec<Vec<String>> = rows.iter().map(knockdown_fields).collect();
    let mut widths: Vec<usize> = KNOCKDOWN_COLUMNS.iter().map(|c| c.chars().count()).collect();
    for fields in &body {
        for (w, f) in widths.iter_mut().zip(fields) {
            *w = (*w).max(f.chars().count());
        }
    }

    let mut out = String::new();
    push_aligned(&mut out, KNOCKDOWN_COLUMNS.iter().copied(), &widths);
    for fields in &body {
        push_aligned(&mut out, fields.iter().map(String::as_str), &widths);
    }
    out
}

fn push_aligned<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let cells: Vec<String> = fields
        .zip(widths)
        .map(|(f, &w)| {
            let pad = w.saturating_sub(f.chars().count());
            format!("{}{}", " ".repeat(pad), f)
        })
        .collect();
    out.push_str(cells.join("  ").trim_end());
    out.push('\n');
}

pub fn render_report_text(grid: &CtGrid, rows: &[KnockdownRow], calibrator: &str) -> String {
    let mut out = String::new();
    out.push_str("qPCR Knockdown Report\n");
    out.push_str("=====================\n\n");
    out.push_str("1. Ct plate\n");
    out.push_str(&render_plate_text(grid));
    out.push('\n');
    out.push_str(&format!("2. Relative expression (calibrator dCt: {})\n", calibrator));
    if rows.is_empty() {
        out.push_str("No target gene results.\n");
    } else {
        out.push_str(&render_knockdown_text(rows));
    }
    out
}
