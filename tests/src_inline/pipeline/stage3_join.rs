use super::*;
use crate::plate::WellAddress;

fn well(label: &str) -> WellAddress {
    WellAddress::parse(label).unwrap()
}

#[test]
fn test_join_drops_wells_without_ct() {
    let ct: CtGrid = WellGrid::from_fn(|w| match w.to_string().as_str() {
        "A1" => Some(20.0),
        "B12" => Some(25.5),
        "H1" => Some(30.0),
        _ => None,
    });
    let samples = WellGrid::from_fn(|w| {
        if w == well("H1") {
            SampleLabel::Empty
        } else {
            SampleLabel::Named(format!("S{}", w.row()))
        }
    });
    let genes = WellGrid::from_fn(|w| {
        if w == well("B12") {
            Assay::MissingGene
        } else {
            Assay::Gene("GAPDH".to_string())
        }
    });

    let obs = join_plate(&ct, &samples, &genes);
    assert_eq!(obs.len(), 3);
    assert_eq!(obs[0].well, well("A1"));
    assert_eq!(obs[0].sample, SampleLabel::Named("S0".to_string()));
    assert_eq!(obs[0].ct, 20.0);
    assert_eq!(obs[1].gene, Assay::MissingGene);
    assert_eq!(obs[2].sample, SampleLabel::Empty);
}

#[test]
fn test_join_is_row_major() {
    let ct: CtGrid = WellGrid::from_fn(|w| Some(10.0 + w.index() as f64));
    let samples = WellGrid::from_fn(|_| SampleLabel::Named("C1".to_string()));
    let genes = WellGrid::from_fn(|_| Assay::Gene("GAPDH".to_string()));
    let obs = join_plate(&ct, &samples, &genes);
    assert_eq!(obs.len(), 96);
    let labels: Vec<String> = obs.iter().take(13).map(|o| o.well.to_string()).collect();
    assert_eq!(labels[11], "A12");
    assert_eq!(labels[12], "B1");
    assert!(obs.windows(2).all(|w| w[0].ct < w[1].ct));
}
