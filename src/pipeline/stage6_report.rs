use std::fs;
use std::path::{Path, PathBuf};

use crate::model::profile::{AnalysisProfile, DesignLayout};
use crate::pipeline::stage1_extract::Stage1Output;
use crate::pipeline::stage2_design::Stage2Output;
use crate::pipeline::stage4_outliers::Stage4Output;
use crate::pipeline::stage5_expression::{CalibratorDeltaCt, Stage5Output};
use crate::report::json::{
    FilterSummary, InputSummary, LegendEntry, PlateSummary, RunSummary, render_summary_json,
};
use crate::report::plate_csv::write_plate_csv;
use crate::report::tsv::write_knockdown_tsv;

pub const PLATE_CSV: &str = "qPCR_plate.csv";
pub const KNOCKDOWN_TSV: &str = "knockdown.tsv";
pub const SUMMARY_JSON: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct Stage6Input<'a> {
    pub ct_path: &'a Path,
    pub design_path: &'a Path,
    pub profile: &'a AnalysisProfile,
    pub layout: &'a DesignLayout,
    pub stage1: &'a Stage1Output,
    pub stage2: &'a Stage2Output,
    pub n_joined: usize,
    pub stage4: &'a Stage4Output,
    pub stage5: &'a Stage5Output,
    pub tool_name: String,
    pub tool_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub plate_csv: PathBuf,
    pub knockdown_tsv: PathBuf,
    pub summary_json: PathBuf,
}

pub fn build_summary(input: &Stage6Input<'_>) -> RunSummary {
    RunSummary {
        tool: input.tool_name.clone(),
        version: input.tool_version.clone(),
        input: InputSummary {
            ct_path: input.ct_path.display().to_string(),
            design_path: input.design_path.display().to_string(),
        },
        analysis: input.profile.clone(),
        layout: input.layout.clone(),
        plate: PlateSummary {
            table_pairs: input.stage1.n_pairs,
            wells_with_ct: input.stage1.ct.n_with_data(),
            no_call_wells: input.stage1.n_no_call,
            discarded_keys: input.stage1.n_discarded_keys,
        },
        legend: input
            .stage2
            .legend
            .entries
            .iter()
            .map(|(color, gene)| LegendEntry {
                color: color.clone(),
                gene: gene.clone(),
            })
            .collect(),
        outlier_filter: FilterSummary {
            joined: input.n_joined,
            kept: input.stage4.observations.len(),
            groups_tested: input.stage4.groups_tested,
            groups_skipped: input.stage4.groups_skipped,
            removed: input.stage4.removed.clone(),
        },
        calibrator_delta_ct: input.stage5.calibrator.clone(),
        results: input.stage5.rows.clone(),
    }
}

pub fn write_reports(
    input: &Stage6Input<'_>,
    out_dir: &Path,
    plate_out: Option<&Path>,
) -> std::io::Result<ReportPaths> {
    fs::create_dir_all(out_dir)?;

    let plate_csv = plate_out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| out_dir.join(PLATE_CSV));
    if let Some(parent) = plate_csv.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_plate_csv(&input.stage1.ct, &plate_csv)?;

    let knockdown_tsv = out_dir.join(KNOCKDOWN_TSV);
    write_knockdown_tsv(&input.stage5.rows, &knockdown_tsv)?;

    let summary_json = out_dir.join(SUMMARY_JSON);
    let json = render_summary_json(&build_summary(input))?;
    fs::write(&summary_json, json)?;

    tracing::info!(
        plate = %plate_csv.display(),
        knockdown = %knockdown_tsv.display(),
        summary = %summary_json.display(),
        "reports written"
    );

    Ok(ReportPaths {
        plate_csv,
        knockdown_tsv,
        summary_json,
    })
}

pub fn calibrator_label(calibrator: &CalibratorDeltaCt) -> String {
    match calibrator {
        CalibratorDeltaCt::Pooled(v) => format!("{}", v),
        CalibratorDeltaCt::PerGene(map) => map
            .iter()
            .map(|(g, v)| format!("{g}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_report.rs"]
mod tests;
