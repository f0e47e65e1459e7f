use super::*;

#[test]
fn test_parse_valid_labels() {
    let a1 = WellAddress::parse("A1").unwrap();
    assert_eq!((a1.row(), a1.col()), (0, 0));
    let h12 = WellAddress::parse("H12").unwrap();
    assert_eq!((h12.row(), h12.col()), (7, 11));
    assert_eq!(h12.to_string(), "H12");
    assert_eq!(WellAddress::parse("C10").unwrap().column_number(), 10);
}

#[test]
fn test_parse_rejects_out_of_plate() {
    for bad in ["I1", "A13", "a1", "H0", "A01", "A", "", "12", "A1 ", "B1x"] {
        assert!(WellAddress::parse(bad).is_none(), "accepted {bad:?}");
    }
}

#[test]
fn test_row_major_order() {
    let labels: Vec<String> = WellAddress::all().map(|w| w.to_string()).collect();
    assert_eq!(labels.len(), N_WELLS);
    assert_eq!(labels[0], "A1");
    assert_eq!(labels[11], "A12");
    assert_eq!(labels[12], "B1");
    assert_eq!(labels[95], "H12");
}

#[test]
fn test_grid_from_fn_and_get() {
    let grid = WellGrid::from_fn(|w| w.index());
    let e5 = WellAddress::parse("E5").unwrap();
    assert_eq!(*grid.get(e5), 4 * 12 + 4);
    assert_eq!(grid.row(1)[0], 12);
}

#[test]
fn test_ct_grid_counts_data() {
    let b2 = WellAddress::parse("B2").unwrap();
    let grid: CtGrid = WellGrid::from_fn(|w| if w == b2 { Some(21.5) } else { None });
    assert_eq!(grid.n_with_data(), 1);
    let empty: CtGrid = WellGrid::from_fn(|_| None);
    assert_eq!(empty.n_with_data(), 0);
}
