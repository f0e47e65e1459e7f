mod input;
mod logging;
mod model;
mod pipeline;
mod plate;
mod report;
mod stats;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::input::{load_design_sheet, load_profile_file};
use crate::model::profile::{AnalysisProfile, CalibratorScope, DesignLayout, ProfileFile};
use crate::pipeline::PipelineError;
use crate::pipeline::stage1_extract::{Stage1Output, load_ct_source};
use crate::pipeline::stage2_design::{Stage2Output, run_stage2};
use crate::pipeline::stage3_join::join_plate;
use crate::pipeline::stage4_outliers::{Stage4Output, run_stage4};
use crate::pipeline::stage5_expression::{Stage5Output, run_stage5};
use crate::pipeline::stage6_report::{Stage6Input, calibrator_label, write_reports};
use crate::report::plate_csv::write_plate_csv;
use crate::report::text::{render_plate_text, render_report_text};

/// Ct extraction and ddCt knockdown statistics for one 96-well qPCR plate.
#[derive(Debug, Parser)]
#[command(name = "kira-ddct", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full analysis: Ct grid, design join, outlier removal, knockdown table.
    Run(RunArgs),
    /// Only extract the Ct grid from an instrument export and write it as CSV.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Instrument export (HTML, TSV or CSV; may be .gz) with Position and Cq
    /// columns, or a plate CSV from an earlier run
    #[arg(long)]
    ct: PathBuf,
    /// Design workbook: .xlsx, or XML Spreadsheet 2003 for any other extension
    #[arg(long)]
    design: PathBuf,
    /// Output directory
    #[arg(long)]
    out: PathBuf,
    /// Alternate path for the raw Ct plate CSV
    #[arg(long)]
    plate_out: Option<PathBuf>,
    /// JSON profile with `analysis` and `layout` sections
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    reference_gene: Option<String>,
    #[arg(long)]
    calibrator_prefix: Option<String>,
    #[arg(long, value_enum)]
    calibrator_scope: Option<ScopeArg>,
    #[arg(long)]
    negative_label: Option<String>,
    /// Text of the cell that sits above the gene/color legend
    #[arg(long)]
    marker: Option<String>,
    /// Do not print the text report to stdout
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Args)]
struct ExtractArgs {
    #[arg(long)]
    ct: PathBuf,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Pooled,
    PerGene,
}

impl From<ScopeArg> for CalibratorScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Pooled => CalibratorScope::Pooled,
            ScopeArg::PerGene => CalibratorScope::PerGene,
        }
    }
}

fn main() {
    logging::init_logging();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Run(args) => run_analysis(&args),
        Command::Extract(args) => run_extract(&args),
    }
}

fn run_analysis(args: &RunArgs) -> Result<(), String> {
    let (profile, layout) = resolve_config(args)?;
    let analysis = analyze(&args.ct, &args.design, &profile, &layout).map_err(|e| e.to_string())?;

    let input = Stage6Input {
        ct_path: &args.ct,
        design_path: &args.design,
        profile: &profile,
        layout: &layout,
        stage1: &analysis.stage1,
        stage2: &analysis.stage2,
        n_joined: analysis.n_joined,
        stage4: &analysis.stage4,
        stage5: &analysis.stage5,
        tool_name: env!("CARGO_PKG_NAME").to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_reports(&input, &args.out, args.plate_out.as_deref()).map_err(|e| e.to_string())?;

    if !args.quiet {
        print!(
            "{}",
            render_report_text(
                &analysis.stage1.ct,
                &analysis.stage5.rows,
                &calibrator_label(&analysis.stage5.calibrator),
            )
        );
    }
    Ok(())
}

fn run_extract(args: &ExtractArgs) -> Result<(), String> {
    let stage1 = load_ct_source(&args.ct).map_err(|e| e.to_string())?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    write_plate_csv(&stage1.ct, &args.out).map_err(|e| e.to_string())?;
    print!("{}", render_plate_text(&stage1.ct));
    Ok(())
}

/// Built-in defaults, then the profile file, then individual flags.
fn resolve_config(args: &RunArgs) -> Result<(AnalysisProfile, DesignLayout), String> {
    let ProfileFile {
        mut analysis,
        mut layout,
    } = match &args.profile {
        Some(path) => load_profile_file(path).map_err(|e| e.to_string())?,
        None => ProfileFile::default(),
    };

    if let Some(gene) = &args.reference_gene {
        analysis.reference_gene = gene.clone();
    }
    if let Some(prefix) = &args.calibrator_prefix {
        analysis.calibrator_prefix = prefix.clone();
    }
    if let Some(scope) = args.calibrator_scope {
        analysis.calibrator_scope = scope.into();
    }
    if let Some(label) = &args.negative_label {
        analysis.negative_label = label.clone();
    }
    if let Some(marker) = &args.marker {
        layout.legend_marker = marker.clone();
    }

    if analysis.reference_gene.trim().is_empty() {
        return Err("reference gene must not be empty".to_string());
    }
    if analysis.calibrator_prefix.is_empty() {
        return Err("calibrator prefix must not be empty".to_string());
    }
    if layout.origin_row == 0 || layout.origin_col == 0 {
        return Err("plate origin is 1-based; row and column must be >= 1".to_string());
    }
    Ok((analysis, layout))
}

#[derive(Debug)]
struct Analysis {
    stage1: Stage1Output,
    stage2: Stage2Output,
    n_joined: usize,
    stage4: Stage4Output,
    stage5: Stage5Output,
}

fn analyze(
    ct_path: &Path,
    design_path: &Path,
    profile: &AnalysisProfile,
    layout: &DesignLayout,
) -> Result<Analysis, PipelineError> {
    let stage1 = load_ct_source(ct_path)?;

    let sheet = load_design_sheet(design_path)?;
    let stage2 = run_stage2(&sheet, layout, &profile.negative_label)?;

    let joined = join_plate(&stage1.ct, &stage2.samples, &stage2.genes);
    let stage4 = run_stage4(&joined, profile);
    let stage5 = run_stage5(&stage4.observations, profile)?;

    Ok(Analysis {
        stage1,
        stage2,
        n_joined: joined.len(),
        stage4,
        stage5,
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
