//! Serializable views derived from the core computations: the per-cycle
//! overview, individual scorecards, the public ranking board, and the
//! leader digest used for monitoring an agency.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::completion::{track_completion, PeerRef};
use super::domain::{
    AgencyId, CriterionId, CycleId, CycleStatus, Evaluation, EvaluationCycle, RatingBand, Scope,
    User, UserId,
};
use super::scope::{open_state, CycleOpenState};
use super::scoring::{aggregate, classify, round1};

/// Placeholder shown when an agency record cannot be resolved.
pub const MISSING_AGENCY_LABEL: &str = "Unassigned";

const TOP_PERFORMER_LIMIT: usize = 8;

/// A cycle as presented to participants, with its derived submission state.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOverview {
    pub id: CycleId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
    pub scope: Scope,
    pub open_state: CycleOpenState,
    pub open_state_label: &'static str,
    pub accepts_submissions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<&'static str>,
    pub configured: bool,
}

pub fn cycle_overview(cycle: &EvaluationCycle, now: DateTime<Utc>) -> CycleOverview {
    let state = open_state(cycle, now);
    CycleOverview {
        id: cycle.id.clone(),
        name: cycle.name.clone(),
        start_date: cycle.start_date,
        end_date: cycle.end_date,
        status: cycle.status,
        scope: cycle.scope.clone(),
        open_state: state,
        open_state_label: state.label(),
        accepts_submissions: state.is_open(),
        blocked_reason: state.blocked_reason(),
        configured: cycle.is_configured(),
    }
}

/// One criterion's average, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionAverage {
    pub criterion_id: CriterionId,
    pub name: String,
    pub average: f64,
}

/// Aggregate plus classification for one evaluatee.
///
/// `rated` distinguishes "scored" from "no submissions yet"; when false the
/// rating fields carry the neutral sentinel and must not be read as a score
/// of zero.
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardView {
    pub cycle_id: CycleId,
    pub evaluatee: PeerRef,
    pub sample_size: usize,
    pub rated: bool,
    pub per_criterion: Vec<CriterionAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_average: Option<f64>,
    pub rating_label: String,
    pub rating_color: String,
}

pub fn scorecard(
    cycle: &EvaluationCycle,
    evaluatee: &User,
    evaluations: &[Evaluation],
) -> ScorecardView {
    let summary = aggregate(&evaluatee.id, &cycle.id, &cycle.criteria, evaluations);
    let rated = summary.has_data();

    let per_criterion = cycle
        .ordered_criteria()
        .into_iter()
        .filter_map(|criterion| {
            summary
                .per_criterion
                .get(&criterion.id)
                .map(|average| CriterionAverage {
                    criterion_id: criterion.id.clone(),
                    name: criterion.name.clone(),
                    average: *average,
                })
        })
        .collect();

    let (overall_average, rating) = if rated {
        let band = classify(summary.overall_average, &cycle.bands);
        (Some(summary.overall_average), band)
    } else {
        (None, RatingBand::unrated())
    };

    ScorecardView {
        cycle_id: cycle.id.clone(),
        evaluatee: PeerRef {
            id: evaluatee.id.clone(),
            name: evaluatee.name.clone(),
        },
        sample_size: summary.sample_size,
        rated,
        per_criterion,
        overall_average,
        rating_label: rating.label,
        rating_color: rating.color,
    }
}

/// One line of the public board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardRow {
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub agency_label: String,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_average: Option<f64>,
    pub rating_label: String,
    pub rating_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingDistributionEntry {
    pub label: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub cycle_id: CycleId,
    pub agency_label: String,
    pub rows: Vec<BoardRow>,
    pub distribution: Vec<RatingDistributionEntry>,
}

/// Rank an agency's staff for one cycle: rated members descending by overall
/// average, unrated members after them, plus a count per rating band.
pub fn agency_board(
    cycle: &EvaluationCycle,
    agency: &AgencyId,
    agency_label: &str,
    agency_users: &[User],
    evaluations: &[Evaluation],
) -> BoardView {
    let participants: Vec<&User> = agency_users
        .iter()
        .filter(|user| &user.agency_id == agency && user.role.takes_part_in_reviews())
        .collect();

    let mut ranked: Vec<(BoardRow, Option<RatingBand>)> = participants
        .iter()
        .map(|user| {
            let summary = aggregate(&user.id, &cycle.id, &cycle.criteria, evaluations);
            let (overall_average, band) = if summary.has_data() {
                let band = classify(summary.overall_average, &cycle.bands);
                (Some(summary.overall_average), Some(band))
            } else {
                (None, None)
            };
            let rating = band.clone().unwrap_or_else(RatingBand::unrated);
            let row = BoardRow {
                user_id: user.id.clone(),
                name: user.name.clone(),
                department: user.department.clone(),
                position: user.position.clone(),
                agency_label: agency_label.to_string(),
                sample_size: summary.sample_size,
                overall_average,
                rating_label: rating.label,
                rating_color: rating.color,
            };
            (row, band)
        })
        .collect();

    ranked.sort_by(|(a, _), (b, _)| match (a.overall_average, b.overall_average) {
        (Some(left), Some(right)) => right
            .total_cmp(&left)
            .then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });

    let mut ordered_bands: Vec<&RatingBand> = cycle.bands.iter().collect();
    ordered_bands.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| b.min_score.total_cmp(&a.min_score))
    });

    let mut distribution: Vec<RatingDistributionEntry> = ordered_bands
        .iter()
        .map(|band| RatingDistributionEntry {
            label: band.label.clone(),
            color: band.color.clone(),
            count: ranked
                .iter()
                .filter(|(_, assigned)| {
                    assigned.as_ref().map(|a| a.id == band.id).unwrap_or(false)
                })
                .count(),
        })
        .collect();

    let unrated = ranked.iter().filter(|(_, band)| band.is_none()).count();
    distribution.push(RatingDistributionEntry {
        label: RatingBand::UNRATED_LABEL.to_string(),
        color: RatingBand::UNRATED_COLOR.to_string(),
        count: unrated,
    });

    BoardView {
        cycle_id: cycle.id.clone(),
        agency_label: agency_label.to_string(),
        rows: ranked.into_iter().map(|(row, _)| row).collect(),
        distribution,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPerformer {
    pub id: UserId,
    pub name: String,
    pub overall_average: f64,
    pub rating_label: String,
}

/// Monitoring summary a leader sees for their agency in one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderDigest {
    pub cycle_id: CycleId,
    pub staff_count: usize,
    pub reviewed_count: usize,
    pub coverage_percent: u8,
    pub criterion_pulse: Vec<CriterionAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub top_performers: Vec<TopPerformer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attention: Vec<String>,
}

pub fn leader_digest(
    cycle: &EvaluationCycle,
    agency: &AgencyId,
    agency_users: &[User],
    evaluations: &[Evaluation],
) -> LeaderDigest {
    let participants: Vec<&User> = agency_users
        .iter()
        .filter(|user| &user.agency_id == agency && user.role.takes_part_in_reviews())
        .collect();
    let staff_count = participants.len();
    let participant_ids: BTreeSet<&UserId> = participants.iter().map(|user| &user.id).collect();

    let agency_evaluations: Vec<&Evaluation> = evaluations
        .iter()
        .filter(|evaluation| evaluation.cycle_id == cycle.id && &evaluation.agency_id == agency)
        .collect();

    let reviewed: BTreeSet<&UserId> = agency_evaluations
        .iter()
        .map(|evaluation| &evaluation.evaluatee_id)
        .filter(|id| participant_ids.contains(id))
        .collect();
    let reviewed_count = reviewed.len();
    let coverage_percent = if staff_count == 0 {
        0
    } else {
        ((reviewed_count * 100) / staff_count) as u8
    };

    let criterion_pulse: Vec<CriterionAverage> = if agency_evaluations.is_empty() {
        Vec::new()
    } else {
        cycle
            .ordered_criteria()
            .into_iter()
            .map(|criterion| {
                let total: f64 = agency_evaluations
                    .iter()
                    .map(|evaluation| {
                        evaluation.scores.get(&criterion.id).copied().unwrap_or(0.0)
                    })
                    .sum();
                CriterionAverage {
                    criterion_id: criterion.id.clone(),
                    name: criterion.name.clone(),
                    average: round1(total / agency_evaluations.len() as f64),
                }
            })
            .collect()
    };

    let average_score = if criterion_pulse.is_empty() {
        None
    } else {
        let sum: f64 = criterion_pulse.iter().map(|entry| entry.average).sum();
        Some(round1(sum / criterion_pulse.len() as f64))
    };

    let mut top_performers: Vec<TopPerformer> = participants
        .iter()
        .filter_map(|user| {
            let summary = aggregate(&user.id, &cycle.id, &cycle.criteria, evaluations);
            summary.has_data().then(|| {
                let band = classify(summary.overall_average, &cycle.bands);
                TopPerformer {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    overall_average: summary.overall_average,
                    rating_label: band.label,
                }
            })
        })
        .collect();
    top_performers.sort_by(|a, b| {
        b.overall_average
            .total_cmp(&a.overall_average)
            .then_with(|| a.name.cmp(&b.name))
    });
    top_performers.truncate(TOP_PERFORMER_LIMIT);

    let completion = track_completion(agency, &cycle.id, agency_users, evaluations);
    let mut attention = Vec::new();
    if staff_count == 0 {
        attention.push("No eligible reviewers in this agency yet".to_string());
    } else if completion.iter().all(|row| row.is_complete) {
        attention.push("All reviewers have submitted their peer reviews".to_string());
    } else {
        for row in completion.iter().filter(|row| !row.is_complete).take(3) {
            let outstanding = row.required.saturating_sub(row.done);
            attention.push(format!(
                "{} still owes {} peer review{} ({}% complete)",
                row.evaluator.name,
                outstanding,
                if outstanding == 1 { "" } else { "s" },
                row.percent
            ));
        }
        let unreviewed = staff_count.saturating_sub(reviewed_count);
        if unreviewed > 0 {
            attention.push(format!(
                "{unreviewed} staff member{} ha{} no ratings yet",
                if unreviewed == 1 { "" } else { "s" },
                if unreviewed == 1 { "s" } else { "ve" }
            ));
        }
    }

    LeaderDigest {
        cycle_id: cycle.id.clone(),
        staff_count,
        reviewed_count,
        coverage_percent,
        criterion_pulse,
        average_score,
        top_performers,
        attention,
    }
}
