//! Cycle scoping: which cycles an agency can see, whether a cycle accepts
//! submissions right now, and the gate every submission must pass.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AgencyId, CycleStatus, EvaluationCycle, Scope, User};

/// Derived submission state of a cycle at a given instant. Exactly one state
/// applies; only [`CycleOpenState::Open`] permits submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOpenState {
    Open,
    Upcoming,
    Expired,
    Paused,
    Closed,
}

impl CycleOpenState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Upcoming => "Upcoming",
            Self::Expired => "Expired",
            Self::Paused => "Paused",
            Self::Closed => "Closed",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// User-facing explanation for why submissions are blocked, mapped 1:1
    /// to the state. `None` while open.
    pub const fn blocked_reason(self) -> Option<&'static str> {
        match self {
            Self::Open => None,
            Self::Upcoming => Some("this cycle has not started yet"),
            Self::Expired => Some("this cycle's evaluation window has ended"),
            Self::Paused => Some("this cycle is temporarily paused"),
            Self::Closed => Some("this cycle has been closed"),
        }
    }
}

/// Cycles visible to an agency, preserving the input order.
pub fn visible_cycles<'a>(
    agency: &AgencyId,
    cycles: &'a [EvaluationCycle],
) -> Vec<&'a EvaluationCycle> {
    cycles
        .iter()
        .filter(|cycle| cycle.scope.includes(agency))
        .collect()
}

/// Resolve the submission state of a cycle at `now`.
///
/// Priority chain: an explicit pause wins, then an explicit close, then the
/// date window. The end date is inclusive through its final second, so
/// submissions on the end date itself still count.
pub fn open_state(cycle: &EvaluationCycle, now: DateTime<Utc>) -> CycleOpenState {
    let today = now.date_naive();

    match cycle.status {
        CycleStatus::Paused => CycleOpenState::Paused,
        CycleStatus::Closed => CycleOpenState::Closed,
        _ if today > cycle.end_date => CycleOpenState::Expired,
        _ if today < cycle.start_date => CycleOpenState::Upcoming,
        CycleStatus::Upcoming => CycleOpenState::Upcoming,
        CycleStatus::Active => CycleOpenState::Open,
    }
}

/// Violations raised when a submission fails the scope gate.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("cycle is not accepting submissions: {reason}")]
    CycleNotOpen {
        state: CycleOpenState,
        reason: &'static str,
    },
    #[error("agency {0} is outside this cycle's target scope")]
    AgencyOutsideScope(AgencyId),
    #[error("a reviewer cannot rate themselves")]
    SelfReview,
    #[error("reviewer and peer must belong to the same agency")]
    CrossAgency,
    #[error("administrators do not take part in peer reviews")]
    AdminExcluded,
}

/// Gate an evaluation submission: the cycle must be open, the reviewer's
/// agency must be in scope, and the pair must be distinct non-admin members
/// of the same agency.
pub fn check_submission(
    cycle: &EvaluationCycle,
    evaluator: &User,
    evaluatee: &User,
    now: DateTime<Utc>,
) -> Result<(), ScopeError> {
    let state = open_state(cycle, now);
    if let Some(reason) = state.blocked_reason() {
        return Err(ScopeError::CycleNotOpen { state, reason });
    }

    if !cycle.scope.includes(&evaluator.agency_id) {
        return Err(ScopeError::AgencyOutsideScope(evaluator.agency_id.clone()));
    }

    if evaluator.id == evaluatee.id {
        return Err(ScopeError::SelfReview);
    }

    if evaluator.agency_id != evaluatee.agency_id {
        return Err(ScopeError::CrossAgency);
    }

    if !evaluator.role.takes_part_in_reviews() || !evaluatee.role.takes_part_in_reviews() {
        return Err(ScopeError::AdminExcluded);
    }

    Ok(())
}

/// Configuration problems rejected when a cycle is created or updated.
#[derive(Debug, thiserror::Error)]
pub enum CycleConfigError {
    #[error("cycle scope must cover all agencies or name at least one")]
    EmptyScope,
    #[error("cycle start date {start} falls after its end date {end}")]
    DatesReversed { start: NaiveDate, end: NaiveDate },
    #[error("a closed cycle cannot change status again")]
    ClosedIsTerminal,
}

/// Validate the scope and window of a new or edited cycle.
pub fn validate_cycle_window(
    scope: &Scope,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), CycleConfigError> {
    if scope.is_empty() {
        return Err(CycleConfigError::EmptyScope);
    }
    if start > end {
        return Err(CycleConfigError::DatesReversed { start, end });
    }
    Ok(())
}

/// Status changes are explicit administrator actions; the only rule is that
/// `Closed` is terminal.
pub fn ensure_status_transition(
    current: CycleStatus,
    _next: CycleStatus,
) -> Result<(), CycleConfigError> {
    if matches!(current, CycleStatus::Closed) {
        return Err(CycleConfigError::ClosedIsTerminal);
    }
    Ok(())
}
