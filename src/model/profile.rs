use serde::{Deserialize, Serialize};

use crate::model::labels::{Assay, AssayRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibratorScope {
    /// One calibrator mean over every calibrator row, whatever the gene.
    Pooled,
    PerGene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisProfile {
    pub reference_gene: String,
    pub calibrator_prefix: String,
    pub calibrator_scope: CalibratorScope,
    pub negative_label: String,
    pub q_crit: f64,
    pub min_outlier_range: f64,
}

impl AnalysisProfile {
    pub fn default_v1() -> Self {
        Self {
            reference_gene: "GAPDH".to_string(),
            calibrator_prefix: "C".to_string(),
            calibrator_scope: CalibratorScope::Pooled,
            negative_label: "NEG".to_string(),
            // Dixon's Q, 95% confidence, n = 3.
            q_crit: 0.941,
            min_outlier_range: 1.5,
        }
    }

    pub fn is_calibrator(&self, sample: &str) -> bool {
        sample.starts_with(self.calibrator_prefix.as_str())
    }

    pub fn role<'a>(&self, assay: &'a Assay) -> AssayRole<'a> {
        match assay {
            Assay::Gene(g) if *g == self.reference_gene => AssayRole::Reference,
            Assay::Gene(g) => AssayRole::Target(g),
            Assay::MissingGene | Assay::Empty => AssayRole::Excluded,
        }
    }
}

impl Default for AnalysisProfile {
    fn default() -> Self {
        Self::default_v1()
    }
}

/// Where things live on the design sheet. Coordinates are 1-based like the
/// spreadsheet itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignLayout {
    pub legend_marker: String,
    pub legend_row_offset: usize,
    pub legend_col_offset: usize,
    pub origin_row: usize,
    pub origin_col: usize,
}

impl DesignLayout {
    pub fn default_v1() -> Self {
        Self {
            legend_marker: "master mix".to_string(),
            legend_row_offset: 1,
            legend_col_offset: 0,
            origin_row: 2,
            origin_col: 2,
        }
    }
}

impl Default for DesignLayout {
    fn default() -> Self {
        Self::default_v1()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    pub analysis: AnalysisProfile,
    pub layout: DesignLayout,
}
