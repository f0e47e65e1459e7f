use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::*;
use crate::model::profile::{AnalysisProfile, CalibratorScope, DesignLayout};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_ddct_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_read_text_plain_and_gz() {
    let dir = make_temp_dir();
    let plain = dir.join("export.tsv");
    let gz = dir.join("export.tsv.gz");
    fs::write(&plain, "Position\tCq\nA1\t20.5\n").unwrap();
    write_gz(&gz, "Position\tCq\nA1\t20.5\n");

    assert_eq!(read_text(&plain).unwrap(), read_text(&gz).unwrap());
}

#[test]
fn test_read_text_replaces_invalid_utf8() {
    let dir = make_temp_dir();
    let path = dir.join("latin1.txt");
    fs::write(&path, b"Temp 60\xb0C\n").unwrap();
    let text = read_text(&path).unwrap();
    assert!(text.starts_with("Temp 60"));
    assert!(text.contains('\u{FFFD}'));
}

#[test]
fn test_missing_file_is_missing_input() {
    let dir = make_temp_dir();
    let err = read_text(&dir.join("nope.html")).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_profile_file_partial_overrides_defaults() {
    let dir = make_temp_dir();
    let path = dir.join("profile.json");
    fs::write(
        &path,
        r#"{"analysis": {"reference_gene": "ACTB", "calibrator_scope": "per-gene"},
            "layout": {"origin_row": 3}}"#,
    )
    .unwrap();

    let profile = load_profile_file(&path).unwrap();
    assert_eq!(profile.analysis.reference_gene, "ACTB");
    assert_eq!(profile.analysis.calibrator_scope, CalibratorScope::PerGene);
    assert_eq!(
        profile.analysis.calibrator_prefix,
        AnalysisProfile::default_v1().calibrator_prefix
    );
    assert_eq!(profile.layout.origin_row, 3);
    assert_eq!(profile.layout.origin_col, DesignLayout::default_v1().origin_col);
}

#[test]
fn test_profile_file_invalid_json() {
    let dir = make_temp_dir();
    let path = dir.join("profile.json");
    fs::write(&path, "{ not json").unwrap();
    let err = load_profile_file(&path).unwrap_err();
    assert!(matches!(err, InputError::Parse(_)));
}
