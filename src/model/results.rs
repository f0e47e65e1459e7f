use serde::Serialize;

use crate::plate::WellAddress;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnockdownRow {
    #[serde(rename = "Sample")]
    pub sample: String,
    #[serde(rename = "Gene")]
    pub gene: String,
    #[serde(rename = "Mean_ΔCt")]
    pub mean_delta_ct: f64,
    #[serde(rename = "STDEV_CT")]
    pub sd_delta_ct: f64,
    #[serde(rename = "Knockdown")]
    pub knockdown: f64,
    #[serde(rename = "Mean_ΔΔCT")]
    pub mean_delta_delta_ct: f64,
    #[serde(rename = "STDEV_KD")]
    pub sd_knockdown: f64,
    #[serde(rename = "Percentage")]
    pub percentage: f64,
    #[serde(rename = "STDEV_%")]
    pub sd_percentage: f64,
    #[serde(rename = "LowerBound")]
    pub lower_bound: f64,
    #[serde(rename = "UpperBound")]
    pub upper_bound: f64,
}

pub const KNOCKDOWN_COLUMNS: [&str; 11] = [
    "Sample",
    "Gene",
    "Mean_ΔCt",
    "STDEV_CT",
    "Knockdown",
    "Mean_ΔΔCT",
    "STDEV_KD",
    "Percentage",
    "STDEV_%",
    "LowerBound",
    "UpperBound",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierRemoval {
    pub sample: String,
    pub gene: String,
    pub well: WellAddress,
    pub ct: f64,
    pub q: f64,
}
