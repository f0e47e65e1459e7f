use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::input::read_text;
use crate::input::table::{LabeledTable, detect_format, parse_table, well_value_pairs};
use crate::pipeline::PipelineError;
use crate::plate::{CtGrid, WellAddress, WellGrid};
use crate::report::plate_csv::{is_plate_csv, parse_plate_csv};

static WELL_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-H](?:[1-9]|1[0-2])$").unwrap());

/// Instrument spellings for "no amplification". These wells carry no data;
/// they are not parse failures.
const NO_CALL_TOKENS: &[&str] = &["", "-", "undetermined", "nan", "n/a", "na"];

#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub ct: CtGrid,
    pub n_pairs: usize,
    pub n_discarded_keys: usize,
    pub n_no_call: usize,
}

pub fn is_well_key(key: &str) -> bool {
    WELL_KEY_RE.is_match(key)
}

pub fn parse_ct_value(well: &str, raw: &str) -> Result<Option<f64>, PipelineError> {
    let trimmed = raw.trim();
    if NO_CALL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        return Ok(None);
    }
    positive_ct(well, raw).map(Some)
}

/// Plate CSV fields are either empty or a Ct. No-call spellings never appear
/// in files this tool writes, so they are rejected like any other bad value.
pub fn parse_plate_ct(well: &str, raw: &str) -> Result<Option<f64>, PipelineError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    positive_ct(well, raw).map(Some)
}

fn positive_ct(well: &str, raw: &str) -> Result<f64, PipelineError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(PipelineError::MalformedCt {
            well: well.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Loads Ct values from either an instrument export or a plate CSV written
/// by an earlier run.
pub fn load_ct_source(path: &Path) -> Result<Stage1Output, PipelineError> {
    let text = read_text(path)?;
    if is_plate_csv(&text) {
        let ct = parse_plate_csv(&text)?;
        tracing::info!(path = %path.display(), wells_with_ct = ct.n_with_data(), "loaded plate CSV");
        return Ok(Stage1Output {
            n_pairs: ct.n_with_data(),
            ct,
            n_discarded_keys: 0,
            n_no_call: 0,
        });
    }
    let format = detect_format(&text);
    tracing::debug!(path = %path.display(), ?format, "parsing instrument table");
    let table = parse_table(&text, format)?;
    run_stage1(&table)
}

pub fn run_stage1(table: &LabeledTable) -> Result<Stage1Output, PipelineError> {
    let pairs = well_value_pairs(table)?;
    extract_ct_grid(&pairs)
}

pub fn extract_ct_grid(pairs: &[(String, String)]) -> Result<Stage1Output, PipelineError> {
    let mut by_well: BTreeMap<WellAddress, Option<f64>> = BTreeMap::new();
    let mut n_discarded_keys = 0usize;
    let mut n_no_call = 0usize;

    for (key, raw) in pairs {
        let key = key.trim();
        if !is_well_key(key) {
            n_discarded_keys += 1;
            continue;
        }
        let Some(well) = WellAddress::parse(key) else {
            n_discarded_keys += 1;
            continue;
        };
        let value = parse_ct_value(key, raw)?;
        if value.is_none() {
            n_no_call += 1;
        }
        if by_well.insert(well, value).is_some() {
            tracing::warn!(well = %well, "well listed more than once in instrument table; keeping last value");
        }
    }

    let ct = WellGrid::from_fn(|w| by_well.get(&w).copied().flatten());
    tracing::info!(
        wells_with_ct = ct.n_with_data(),
        no_call = n_no_call,
        discarded_keys = n_discarded_keys,
        "extracted Ct grid"
    );

    Ok(Stage1Output {
        ct,
        n_pairs: pairs.len(),
        n_discarded_keys,
        n_no_call,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_extract.rs"]
mod tests;
