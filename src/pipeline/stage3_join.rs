use crate::model::labels::{Assay, SampleLabel};
use crate::model::observation::Observation;
use crate::plate::{CtGrid, WellGrid};

/// Inner join of the Ct grid with the two design grids, row-major. Wells
/// without a Ct reading are dropped; sentinel samples and genes are kept as
/// tagged records for later stages to skip.
pub fn join_plate(
    ct: &CtGrid,
    samples: &WellGrid<SampleLabel>,
    genes: &WellGrid<Assay>,
) -> Vec<Observation> {
    let mut out = Vec::with_capacity(ct.n_with_data());
    for (well, value) in ct.iter() {
        let Some(ct) = *value else {
            continue;
        };
        out.push(Observation {
            sample: samples.get(well).clone(),
            well,
            gene: genes.get(well).clone(),
            ct,
        });
    }
    tracing::info!(observations = out.len(), "joined plate with design");
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_join.rs"]
mod tests;
