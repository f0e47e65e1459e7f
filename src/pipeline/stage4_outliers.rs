use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::observation::Observation;
use crate::model::profile::AnalysisProfile;
use crate::model::results::OutlierRemoval;
use crate::plate::WellAddress;

#[derive(Debug, Error, PartialEq)]
pub enum OutlierTestError {
    #[error("Dixon's Q test for n=3 requires exactly 3 values, got {0}")]
    Arity(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DixonOutcome {
    /// Index into the caller's slice of the flagged value.
    pub index: usize,
    pub value: f64,
    pub q: f64,
}

#[derive(Debug, Clone)]
pub struct Stage4Output {
    pub observations: Vec<Observation>,
    pub removed: Vec<OutlierRemoval>,
    pub groups_tested: usize,
    pub groups_skipped: usize,
}

/// Dixon's Q test for exactly three replicates. Spreads of `min_range` Ct or
/// less are never flagged.
pub fn dixon_q_n3(
    values: &[f64],
    q_crit: f64,
    min_range: f64,
) -> Result<Option<DixonOutcome>, OutlierTestError> {
    if values.len() != 3 {
        return Err(OutlierTestError::Arity(values.len()));
    }
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let [lo, mid, hi] = order.map(|i| values[i]);

    let range = hi - lo;
    if range <= min_range {
        return Ok(None);
    }

    let q_min = (mid - lo) / range;
    let q_max = (hi - mid) / range;
    if q_min > q_crit {
        Ok(Some(DixonOutcome {
            index: order[0],
            value: lo,
            q: q_min,
        }))
    } else if q_max > q_crit {
        Ok(Some(DixonOutcome {
            index: order[2],
            value: hi,
            q: q_max,
        }))
    } else {
        Ok(None)
    }
}

/// Drops at most one replicate per (sample, gene) group. Only named samples
/// with named genes are tested, and only groups of exactly three wells.
pub fn run_stage4(observations: &[Observation], profile: &AnalysisProfile) -> Stage4Output {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (idx, obs) in observations.iter().enumerate() {
        match obs.group_key() {
            Some(key) => groups.entry(key).or_default().push(idx),
            None => tracing::debug!(
                well = %obs.well,
                sample = %obs.sample,
                gene = %obs.gene,
                "not a replicate group; outlier test does not apply"
            ),
        }
    }

    let mut drop_wells: BTreeSet<WellAddress> = BTreeSet::new();
    let mut removed = Vec::new();
    let mut groups_tested = 0usize;
    let mut groups_skipped = 0usize;

    for ((sample, gene), members) in &groups {
        if members.len() != 3 {
            tracing::debug!(sample, gene, n = members.len(), "outlier test skipped: not a triplicate");
            groups_skipped += 1;
            continue;
        }
        groups_tested += 1;
        let values: Vec<f64> = members.iter().map(|&i| observations[i].ct).collect();
        let outcome = match dixon_q_n3(&values, profile.q_crit, profile.min_outlier_range) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(sample, gene, %err, "outlier test misuse");
                continue;
            }
        };
        if let Some(hit) = outcome {
            let obs = &observations[members[hit.index]];
            tracing::info!(
                sample,
                gene,
                well = %obs.well,
                ct = hit.value,
                q = hit.q,
                "removing outlier replicate"
            );
            drop_wells.insert(obs.well);
            removed.push(OutlierRemoval {
                sample: sample.to_string(),
                gene: gene.to_string(),
                well: obs.well,
                ct: obs.ct,
                q: hit.q,
            });
        }
    }

    let kept = observations
        .iter()
        .filter(|o| !drop_wells.contains(&o.well))
        .cloned()
        .collect();

    Stage4Output {
        observations: kept,
        removed,
        groups_tested,
        groups_skipped,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_outliers.rs"]
mod tests;
