use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::input::table::parse_delimited;
use crate::report::plate_csv::render_plate_csv;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_ddct_stage1_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn well(label: &str) -> WellAddress {
    WellAddress::parse(label).unwrap()
}

#[test]
fn test_well_key_pattern() {
    for ok in ["A1", "A9", "A10", "A12", "H1", "H12", "D7"] {
        assert!(is_well_key(ok), "{ok}");
    }
    for bad in ["I1", "A13", "a1", "H13", "A0", "A01", "Position", "", " A1"] {
        assert!(!is_well_key(bad), "{bad}");
    }
}

#[test]
fn test_only_plate_keys_are_mapped() {
    let out = extract_ct_grid(&pairs(&[
        ("A1", "20.5"),
        ("H12", "31.25"),
        ("I1", "22.0"),
        ("A13", "22.0"),
        ("a1", "22.0"),
        ("Position", "Cq"),
    ]))
    .unwrap();
    assert_eq!(out.ct.n_with_data(), 2);
    assert_eq!(*out.ct.get(well("A1")), Some(20.5));
    assert_eq!(*out.ct.get(well("H12")), Some(31.25));
    assert_eq!(out.n_discarded_keys, 4);
    assert_eq!(out.n_pairs, 6);
}

#[test]
fn test_unaddressed_wells_are_no_data() {
    let out = extract_ct_grid(&pairs(&[("B3", "25")])).unwrap();
    assert_eq!(*out.ct.get(well("B4")), None);
    assert_eq!(out.ct.n_with_data(), 1);
}

#[test]
fn test_undetermined_is_excluded_not_zero() {
    let out = extract_ct_grid(&pairs(&[("A1", "Undetermined"), ("A2", "-"), ("A3", "")])).unwrap();
    assert_eq!(out.ct.n_with_data(), 0);
    assert_eq!(out.n_no_call, 3);
}

#[test]
fn test_malformed_value_fails_with_well() {
    let err = extract_ct_grid(&pairs(&[("A1", "20.1"), ("C4", "twenty")])).unwrap_err();
    match err {
        PipelineError::MalformedCt { well, value } => {
            assert_eq!(well, "C4");
            assert_eq!(value, "twenty");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_non_positive_ct_is_malformed() {
    assert!(parse_ct_value("A1", "0").is_err());
    assert!(parse_ct_value("A1", "-3.2").is_err());
    assert!(parse_ct_value("A1", "inf").is_err());
    assert_eq!(parse_ct_value("A1", " 18.75 ").unwrap(), Some(18.75));
}

#[test]
fn test_duplicate_key_last_wins() {
    let out = extract_ct_grid(&pairs(&[("A1", "20.0"), ("A1", "21.0")])).unwrap();
    assert_eq!(*out.ct.get(well("A1")), Some(21.0));
}

#[test]
fn test_run_stage1_from_table() {
    let table = parse_delimited("Position\tName\tCq\nA1\tC1\t20.1\nB2\tKD1\t22.4\n", '\t');
    let out = run_stage1(&table).unwrap();
    assert_eq!(out.ct.n_with_data(), 2);
    assert_eq!(*out.ct.get(well("B2")), Some(22.4));
}

#[test]
fn test_load_ct_source_accepts_plate_csv() {
    let dir = make_temp_dir();
    let original = extract_ct_grid(&pairs(&[("A1", "20.123"), ("G9", "33.5")]))
        .unwrap()
        .ct;
    let path = dir.join("qPCR_plate.csv");
    fs::write(&path, render_plate_csv(&original)).unwrap();

    let loaded = load_ct_source(&path).unwrap();
    assert_eq!(loaded.ct, original);
}

#[test]
fn test_load_ct_source_rejects_invalid_plate_csv_values() {
    let dir = make_temp_dir();
    let blank = render_plate_csv(&WellGrid::from_fn(|_| None));
    for (bad, label) in [("NaN", "A1"), ("-5", "A1"), ("inf", "A1"), ("0", "A1")] {
        let path = dir.join(format!("plate_{label}_{}.csv", bad.replace('-', "m")));
        fs::write(&path, blank.replacen("A,", &format!("A,{bad}"), 1)).unwrap();
        match load_ct_source(&path) {
            Err(PipelineError::MalformedCt { well, value }) => {
                assert_eq!(well, label);
                assert_eq!(value, bad);
            }
            other => panic!("{bad}: expected MalformedCt, got {other:?}"),
        }
    }
}

#[test]
fn test_plate_ct_rejects_no_call_spellings() {
    assert_eq!(parse_plate_ct("A1", "").unwrap(), None);
    assert_eq!(parse_plate_ct("A1", " 21.5 ").unwrap(), Some(21.5));
    assert!(parse_plate_ct("A1", "Undetermined").is_err());
    assert!(parse_plate_ct("A1", "nan").is_err());
}

#[test]
fn test_load_ct_source_accepts_tsv_export() {
    let dir = make_temp_dir();
    let path = dir.join("export.txt");
    fs::write(&path, "Include\tPosition\tCq\nTrue\tA5\t27.0\n").unwrap();
    let loaded = load_ct_source(&path).unwrap();
    assert_eq!(*loaded.ct.get(well("A5")), Some(27.0));
}
