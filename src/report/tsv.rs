use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::model::results::{KNOCKDOWN_COLUMNS, KnockdownRow};
use crate::report::format_f64;

/// Design cells are free text; tabs and line breaks would split the record.
fn text_field(raw: &str) -> String {
    raw.replace(['\t', '\r', '\n'], " ")
}

pub fn knockdown_fields(row: &KnockdownRow) -> Vec<String> {
    vec![
        text_field(&row.sample),
        text_field(&row.gene),
        format_f64(row.mean_delta_ct),
        format_f64(row.sd_delta_ct),
        format_f64(row.knockdown),
        format_f64(row.mean_delta_delta_ct),
        format_f64(row.sd_knockdown),
        format_f64(row.percentage),
        format_f64(row.sd_percentage),
        format_f64(row.lower_bound),
        format_f64(row.upper_bound),
    ]
}

pub fn render_knockdown_tsv(rows: &[KnockdownRow]) -> String {
    let mut out = KNOCKDOWN_COLUMNS.join("\t");
    out.push('\n');
    for row in rows {
        out.push_str(&knockdown_fields(row).join("\t"));
        out.push('\n');
    }
    out
}

pub fn write_knockdown_tsv(rows: &[KnockdownRow], path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(render_knockdown_tsv(rows).as_bytes())?;
    w.flush()
}
