use serde::Serialize;

use crate::model::profile::{AnalysisProfile, DesignLayout};
use crate::model::results::{KnockdownRow, OutlierRemoval};
use crate::pipeline::stage5_expression::CalibratorDeltaCt;

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub ct_path: String,
    pub design_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlateSummary {
    pub table_pairs: usize,
    pub wells_with_ct: usize,
    pub no_call_wells: usize,
    pub discarded_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub gene: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterSummary {
    pub joined: usize,
    pub kept: usize,
    pub groups_tested: usize,
    pub groups_skipped: usize,
    pub removed: Vec<OutlierRemoval>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub input: InputSummary,
    pub analysis: AnalysisProfile,
    pub layout: DesignLayout,
    pub plate: PlateSummary,
    pub legend: Vec<LegendEntry>,
    pub outlier_filter: FilterSummary,
    pub calibrator_delta_ct: CalibratorDeltaCt,
    pub results: Vec<KnockdownRow>,
}

pub fn render_summary_json(summary: &RunSummary) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(summary)?;
    out.push('\n');
    Ok(out)
}
