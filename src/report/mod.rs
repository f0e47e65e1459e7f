pub mod json;
pub mod plate_csv;
pub mod text;
pub mod tsv;

/// Shortest representation that parses back to the same `f64`.
pub fn format_f64(v: f64) -> String {
    format!("{}", v)
}

pub fn format_ct(v: Option<f64>) -> String {
    match v {
        Some(ct) => format!("{:.2}", ct),
        None => "-".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
