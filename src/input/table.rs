use std::sync::LazyLock;

use regex::Regex;

use crate::input::InputError;

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)(?:</table\s*>|$)").unwrap());
static ROW_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<tr\b[^>]*>").unwrap());
static ROW_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</tr\s*>").unwrap());
static CELL_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<t[dh]\b[^>]*>").unwrap());
static CELL_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</t[dh]\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Rows of trimmed cell text. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledTable {
    pub rows: Vec<Vec<String>>,
}

impl LabeledTable {
    pub fn n_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Html,
    Tsv,
    Csv,
}

pub fn detect_format(text: &str) -> TableFormat {
    let head: String = text.chars().take(4096).collect::<String>().to_ascii_lowercase();
    if head.contains("<table") || head.contains("<html") {
        TableFormat::Html
    } else if head.contains('\t') {
        TableFormat::Tsv
    } else {
        TableFormat::Csv
    }
}

pub fn parse_table(text: &str, format: TableFormat) -> Result<LabeledTable, InputError> {
    match format {
        TableFormat::Html => parse_html_table(text),
        TableFormat::Tsv => Ok(parse_delimited(text, '\t')),
        TableFormat::Csv => Ok(parse_delimited(text, ',')),
    }
}

/// First `<table>` of an HTML document. Nested markup inside cells is
/// flattened to its text.
pub fn parse_html_table(text: &str) -> Result<LabeledTable, InputError> {
    let body = TABLE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| InputError::Parse("no <table> element in HTML export".to_string()))?
        .as_str();

    let mut rows = Vec::new();
    for row in element_bodies(body, &ROW_OPEN_RE, &ROW_CLOSE_RE) {
        let cells: Vec<String> = element_bodies(row, &CELL_OPEN_RE, &CELL_CLOSE_RE)
            .into_iter()
            .map(html_cell_text)
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    Ok(LabeledTable { rows })
}

/// Content of each element opened by `open`. HTML lets `</tr>` and `</td>`
/// be omitted, so an element also ends where the next one of its kind opens.
fn element_bodies<'t>(text: &'t str, open: &Regex, close: &Regex) -> Vec<&'t str> {
    let tags: Vec<(usize, usize)> = open.find_iter(text).map(|m| (m.start(), m.end())).collect();
    tags.iter()
        .enumerate()
        .map(|(i, &(_, body_start))| {
            let limit = tags.get(i + 1).map_or(text.len(), |&(next, _)| next);
            let body = &text[body_start..limit];
            close.find(body).map_or(body, |m| &body[..m.start()])
        })
        .collect()
}

fn html_cell_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WS_RE.replace_all(decoded.trim(), " ").into_owned()
}

pub fn parse_delimited(text: &str, delim: char) -> LabeledTable {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        rows.push(split_record(line, delim));
    }
    LabeledTable { rows }
}

fn split_record(line: &str, delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delim && !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

pub fn find_column(table: &LabeledTable, pred: impl Fn(&str) -> bool) -> Option<usize> {
    (0..table.n_cols()).find(|&col| {
        table
            .rows
            .iter()
            .any(|row| row.get(col).is_some_and(|cell| pred(cell)))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtColumns {
    pub position: usize,
    pub cq: usize,
}

/// Locates the well-position column (a cell containing `Position`) and the
/// Ct column (a cell exactly `Cq`). The first match wins; later `Cq`-like
/// columns in Roche exports hold other quantities.
pub fn locate_ct_columns(table: &LabeledTable) -> Result<CtColumns, InputError> {
    let position = find_column(table, |cell| cell.contains("Position")).ok_or_else(|| {
        InputError::InvalidInput("no column labeled \"Position\" in instrument table".to_string())
    })?;
    let cq = find_column(table, |cell| cell.trim() == "Cq").ok_or_else(|| {
        InputError::InvalidInput("no column labeled \"Cq\" in instrument table".to_string())
    })?;
    Ok(CtColumns { position, cq })
}

/// Well-key/raw-value pairs from every row carrying both columns. Keys are
/// not validated here.
pub fn well_value_pairs(table: &LabeledTable) -> Result<Vec<(String, String)>, InputError> {
    let cols = locate_ct_columns(table)?;
    let mut pairs = Vec::new();
    for row in &table.rows {
        if let (Some(pos), Some(cq)) = (row.get(cols.position), row.get(cols.cq)) {
            pairs.push((pos.clone(), cq.clone()));
        }
    }
    Ok(pairs)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/table.rs"]
mod tests;
