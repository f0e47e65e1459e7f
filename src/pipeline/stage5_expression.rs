use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::labels::AssayRole;
use crate::model::observation::Observation;
use crate::model::profile::{AnalysisProfile, CalibratorScope};
use crate::model::results::KnockdownRow;
use crate::pipeline::PipelineError;
use crate::stats::{mean, pstdev, round3, round5};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CalibratorDeltaCt {
    Pooled(f64),
    PerGene(BTreeMap<String, f64>),
}

impl CalibratorDeltaCt {
    pub fn for_gene(&self, gene: &str) -> Option<f64> {
        match self {
            CalibratorDeltaCt::Pooled(v) => Some(*v),
            CalibratorDeltaCt::PerGene(map) => map.get(gene).copied(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage5Output {
    pub rows: Vec<KnockdownRow>,
    pub calibrator: CalibratorDeltaCt,
}

/// Every pairwise target-minus-reference difference for one sample/gene.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaCt {
    pub sample: String,
    pub gene: String,
    pub values: Vec<f64>,
    pub mean: f64,
    pub sd: f64,
}

pub fn pairwise_delta_ct(exp_cts: &[f64], control_cts: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(exp_cts.len() * control_cts.len());
    for e in exp_cts {
        for c in control_cts {
            out.push(round3(e - c));
        }
    }
    out
}

/// Groups readings by sample then gene, both in order of first appearance.
fn group_readings<'a>(
    observations: &'a [Observation],
    profile: &AnalysisProfile,
) -> Vec<(&'a str, Vec<f64>, Vec<(&'a str, Vec<f64>)>)> {
    let mut samples: Vec<(&str, Vec<f64>, Vec<(&str, Vec<f64>)>)> = Vec::new();
    for obs in observations {
        let Some(sample) = obs.sample.name() else {
            continue;
        };
        let role = profile.role(&obs.gene);
        if role == AssayRole::Excluded {
            continue;
        }
        let idx = match samples.iter().position(|(s, _, _)| *s == sample) {
            Some(idx) => idx,
            None => {
                samples.push((sample, Vec::new(), Vec::new()));
                samples.len() - 1
            }
        };
        let entry = &mut samples[idx];
        match role {
            AssayRole::Reference => entry.1.push(obs.ct),
            AssayRole::Target(gene) => match entry.2.iter_mut().find(|(g, _)| *g == gene) {
                Some((_, cts)) => cts.push(obs.ct),
                None => entry.2.push((gene, vec![obs.ct])),
            },
            AssayRole::Excluded => {}
        }
    }
    samples
}

pub fn compute_delta_ct(
    observations: &[Observation],
    profile: &AnalysisProfile,
) -> Result<Vec<DeltaCt>, PipelineError> {
    let mut out = Vec::new();
    for (sample, control_cts, targets) in group_readings(observations, profile) {
        for (gene, exp_cts) in targets {
            if control_cts.is_empty() {
                return Err(PipelineError::MissingReference {
                    sample: sample.to_string(),
                    gene: gene.to_string(),
                    reference: profile.reference_gene.clone(),
                });
            }
            let values = pairwise_delta_ct(&exp_cts, &control_cts);
            out.push(DeltaCt {
                sample: sample.to_string(),
                gene: gene.to_string(),
                mean: round5(mean(&values)),
                sd: round5(pstdev(&values)),
                values,
            });
        }
    }
    Ok(out)
}

pub fn calibrator_delta_ct(
    deltas: &[DeltaCt],
    profile: &AnalysisProfile,
) -> Result<CalibratorDeltaCt, PipelineError> {
    let calibrators = deltas.iter().filter(|d| profile.is_calibrator(&d.sample));
    match profile.calibrator_scope {
        CalibratorScope::Pooled => {
            let means: Vec<f64> = calibrators.map(|d| d.mean).collect();
            if means.is_empty() {
                return Err(PipelineError::NoCalibrator {
                    prefix: profile.calibrator_prefix.clone(),
                    scope: String::new(),
                });
            }
            Ok(CalibratorDeltaCt::Pooled(mean(&means)))
        }
        CalibratorScope::PerGene => {
            let mut by_gene: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for d in calibrators {
                by_gene.entry(d.gene.clone()).or_default().push(d.mean);
            }
            for d in deltas {
                if !by_gene.contains_key(&d.gene) {
                    return Err(PipelineError::NoCalibrator {
                        prefix: profile.calibrator_prefix.clone(),
                        scope: format!(" for gene {}", d.gene),
                    });
                }
            }
            Ok(CalibratorDeltaCt::PerGene(
                by_gene.into_iter().map(|(g, m)| (g, mean(&m))).collect(),
            ))
        }
    }
}

pub fn knockdown_row(delta: &DeltaCt, calibrator: f64) -> KnockdownRow {
    let dd: Vec<f64> = delta.values.iter().map(|v| round5(v - calibrator)).collect();
    let kd: Vec<f64> = dd.iter().map(|v| round5(2f64.powf(-v))).collect();
    let kd_mean = mean(&kd);
    let kd_sd = pstdev(&kd);

    KnockdownRow {
        sample: delta.sample.clone(),
        gene: delta.gene.clone(),
        mean_delta_ct: delta.mean,
        sd_delta_ct: delta.sd,
        knockdown: kd_mean,
        mean_delta_delta_ct: mean(&dd),
        sd_knockdown: kd_sd,
        percentage: kd_mean * 100.0,
        sd_percentage: round5(kd_sd * 100.0),
        lower_bound: round5((kd_mean - kd_sd) * 100.0),
        upper_bound: round5((kd_mean + kd_sd) * 100.0),
    }
}

pub fn run_stage5(
    observations: &[Observation],
    profile: &AnalysisProfile,
) -> Result<Stage5Output, PipelineError> {
    let deltas = compute_delta_ct(observations, profile)?;
    let calibrator = calibrator_delta_ct(&deltas, profile)?;

    let mut rows = Vec::with_capacity(deltas.len());
    for delta in &deltas {
        let Some(cal) = calibrator.for_gene(&delta.gene) else {
            return Err(PipelineError::NoCalibrator {
                prefix: profile.calibrator_prefix.clone(),
                scope: format!(" for gene {}", delta.gene),
            });
        };
        rows.push(knockdown_row(delta, cal));
    }

    match &calibrator {
        CalibratorDeltaCt::Pooled(v) => {
            tracing::info!(calibrator_delta_ct = *v, rows = rows.len(), "knockdown computed")
        }
        CalibratorDeltaCt::PerGene(map) => {
            tracing::info!(genes = map.len(), rows = rows.len(), "knockdown computed (per-gene calibrator)")
        }
    }

    Ok(Stage5Output { rows, calibrator })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_expression.rs"]
mod tests;
