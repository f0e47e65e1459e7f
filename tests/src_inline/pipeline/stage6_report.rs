use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::model::labels::{Assay, SampleLabel};
use crate::model::observation::Observation;
use crate::model::results::OutlierRemoval;
use crate::pipeline::stage2_design::GeneLegend;
use crate::pipeline::stage5_expression::run_stage5;
use crate::plate::{WellAddress, WellGrid};
use crate::report::plate_csv::parse_plate_csv;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_ddct_report_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

struct Fixture {
    profile: AnalysisProfile,
    layout: DesignLayout,
    stage1: Stage1Output,
    stage2: Stage2Output,
    stage4: Stage4Output,
    stage5: Stage5Output,
}

/// C1 in row A, KD1 in row B; GAPDH in columns 1-3, TP53 in 4-6.
fn fixture() -> Fixture {
    let profile = AnalysisProfile::default_v1();
    let ct = WellGrid::from_fn(|w| {
        if w.row() > 1 || w.col() > 5 {
            return None;
        }
        Some(match (w.row(), w.col() < 3) {
            (_, true) => 20.0,
            (0, false) => 22.0,
            _ => 24.0,
        })
    });
    let samples = WellGrid::from_fn(|w| match w.row() {
        0 => SampleLabel::Named("C1".to_string()),
        1 => SampleLabel::Named("KD1".to_string()),
        _ => SampleLabel::Empty,
    });
    let genes = WellGrid::from_fn(|w| match w.col() {
        0..=2 => Assay::Gene("GAPDH".to_string()),
        3..=5 => Assay::Gene("TP53".to_string()),
        _ => Assay::Empty,
    });
    let observations: Vec<Observation> = ct
        .iter()
        .filter_map(|(well, v)| {
            v.map(|ct| Observation {
                sample: samples.get(well).clone(),
                well,
                gene: genes.get(well).clone(),
                ct,
            })
        })
        .collect();
    let stage5 = run_stage5(&observations, &profile).unwrap();
    let stage4 = Stage4Output {
        observations,
        removed: vec![OutlierRemoval {
            sample: "KD1".to_string(),
            gene: "TP53".to_string(),
            well: WellAddress::parse("B7").unwrap(),
            ct: 31.0,
            q: 0.99,
        }],
        groups_tested: 4,
        groups_skipped: 0,
    };
    Fixture {
        profile,
        layout: DesignLayout::default_v1(),
        stage1: Stage1Output {
            ct,
            n_pairs: 14,
            n_discarded_keys: 1,
            n_no_call: 1,
        },
        stage2: Stage2Output {
            samples,
            genes,
            legend: GeneLegend::from_entries(vec![
                ("FF0000".to_string(), "GAPDH".to_string()),
                ("0000FF".to_string(), "TP53".to_string()),
            ]),
        },
        stage4,
        stage5,
    }
}

fn input<'a>(f: &'a Fixture) -> Stage6Input<'a> {
    Stage6Input {
        ct_path: Path::new("run/export.html"),
        design_path: Path::new("run/design.xml"),
        profile: &f.profile,
        layout: &f.layout,
        stage1: &f.stage1,
        stage2: &f.stage2,
        n_joined: 13,
        stage4: &f.stage4,
        stage5: &f.stage5,
        tool_name: "kira-ddct".to_string(),
        tool_version: "0.0.0-test".to_string(),
    }
}

#[test]
fn test_summary_counts() {
    let f = fixture();
    let summary = build_summary(&input(&f));
    assert_eq!(summary.plate.wells_with_ct, 12);
    assert_eq!(summary.plate.table_pairs, 14);
    assert_eq!(summary.outlier_filter.joined, 13);
    assert_eq!(summary.outlier_filter.kept, 12);
    assert_eq!(summary.outlier_filter.removed.len(), 1);
    assert_eq!(summary.legend.len(), 2);
    assert_eq!(summary.legend[1].gene, "TP53");
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.input.ct_path, "run/export.html");
}

#[test]
fn test_summary_json_shape() {
    let f = fixture();
    let json = render_summary_json(&build_summary(&input(&f))).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["tool"], "kira-ddct");
    assert_eq!(v["calibrator_delta_ct"], 2.0);
    assert_eq!(v["analysis"]["calibrator_scope"], "pooled");
    assert_eq!(v["outlier_filter"]["removed"][0]["well"], "B7");
    assert_eq!(v["results"][1]["Sample"], "KD1");
    assert_eq!(v["results"][1]["Percentage"], 25.0);
}

#[test]
fn test_write_reports_creates_all_files() {
    let f = fixture();
    let dir = make_temp_dir().join("out");
    let paths = write_reports(&input(&f), &dir, None).unwrap();
    assert_eq!(paths.plate_csv, dir.join(PLATE_CSV));
    assert_eq!(paths.knockdown_tsv, dir.join(KNOCKDOWN_TSV));
    assert_eq!(paths.summary_json, dir.join(SUMMARY_JSON));

    let plate = fs::read_to_string(&paths.plate_csv).unwrap();
    assert_eq!(parse_plate_csv(&plate).unwrap(), f.stage1.ct);

    let tsv = fs::read_to_string(&paths.knockdown_tsv).unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Sample\tGene\tMean_ΔCt"));
    assert!(lines[2].starts_with("KD1\tTP53\t4\t0\t0.25\t2\t"));

    assert!(fs::read_to_string(&paths.summary_json).unwrap().ends_with("}\n"));
}

#[test]
fn test_write_reports_honors_plate_override() {
    let f = fixture();
    let root = make_temp_dir();
    let out = root.join("out");
    let plate = root.join("plates").join("run1.csv");
    let paths = write_reports(&input(&f), &out, Some(&plate)).unwrap();
    assert_eq!(paths.plate_csv, plate);
    assert!(plate.exists());
    assert!(!out.join(PLATE_CSV).exists());
}

#[test]
fn test_calibrator_label() {
    assert_eq!(calibrator_label(&CalibratorDeltaCt::Pooled(2.5)), "2.5");
    let mut map = BTreeMap::new();
    map.insert("TP53".to_string(), 2.0);
    map.insert("MYC".to_string(), 3.25);
    assert_eq!(
        calibrator_label(&CalibratorDeltaCt::PerGene(map)),
        "MYC=3.25, TP53=2"
    );
}
