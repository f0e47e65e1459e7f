use crate::model::labels::{Assay, SampleLabel};
use crate::plate::WellAddress;

/// One Ct reading tagged with its design annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub sample: SampleLabel,
    pub well: WellAddress,
    pub gene: Assay,
    pub ct: f64,
}

impl Observation {
    /// Key of the replicate group this reading belongs to, when both the
    /// sample and the gene are real (non-sentinel) labels.
    pub fn group_key(&self) -> Option<(&str, &str)> {
        Some((self.sample.name()?, self.gene.name()?))
    }
}
