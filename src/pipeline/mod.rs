use thiserror::Error;

use crate::input::InputError;

pub mod stage1_extract;
pub mod stage2_design;
pub mod stage3_join;
pub mod stage4_outliers;
pub mod stage5_expression;
pub mod stage6_report;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("malformed Ct value {value:?} in well {well}")]
    MalformedCt { well: String, value: String },
    #[error("design sheet has no legend anchor containing {marker:?}")]
    LegendNotFound { marker: String },
    #[error("sample {sample:?} has {gene} readings but no {reference} readings to normalize against")]
    MissingReference {
        sample: String,
        gene: String,
        reference: String,
    },
    #[error("no calibrator samples (prefix {prefix:?}) with target gene data{scope}")]
    NoCalibrator { prefix: String, scope: String },
}
