use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{Criterion, CriterionId, CycleId, Evaluation, UserId};
use super::round1;

/// Aggregated scores for one evaluatee within one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub per_criterion: BTreeMap<CriterionId, f64>,
    pub overall_average: f64,
    pub sample_size: usize,
}

impl ScoreSummary {
    /// Sentinel for "no submissions yet" or "cycle not configured". The
    /// zeroed averages are placeholders, not scores; callers must branch on
    /// [`Self::has_data`] before classifying.
    pub fn no_data() -> Self {
        Self {
            per_criterion: BTreeMap::new(),
            overall_average: 0.0,
            sample_size: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.sample_size > 0
    }
}

/// Compute averages for `evaluatee` from whatever snapshot of evaluations is
/// passed in. Deterministic for a fixed snapshot, regardless of record order.
pub fn aggregate(
    evaluatee: &UserId,
    cycle: &CycleId,
    criteria: &[Criterion],
    evaluations: &[Evaluation],
) -> ScoreSummary {
    let relevant: Vec<&Evaluation> = evaluations
        .iter()
        .filter(|evaluation| {
            &evaluation.evaluatee_id == evaluatee && &evaluation.cycle_id == cycle
        })
        .collect();

    if relevant.is_empty() || criteria.is_empty() {
        return ScoreSummary::no_data();
    }

    let sample_size = relevant.len();
    let mut per_criterion = BTreeMap::new();
    for criterion in criteria {
        // Submissions predating a criteria edit may lack a key; those count
        // as zero instead of being dropped.
        let total: f64 = relevant
            .iter()
            .map(|evaluation| evaluation.scores.get(&criterion.id).copied().unwrap_or(0.0))
            .sum();
        per_criterion.insert(criterion.id.clone(), round1(total / sample_size as f64));
    }

    // Equal-weighted mean of the per-criterion means, not a mean of all raw
    // scores.
    let overall = per_criterion.values().sum::<f64>() / per_criterion.len() as f64;

    ScoreSummary {
        per_criterion,
        overall_average: round1(overall),
        sample_size,
    }
}
