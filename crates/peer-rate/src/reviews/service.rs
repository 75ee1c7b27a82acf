use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::reviews::board::{
    agency_board, cycle_overview, leader_digest, scorecard, BoardView, CycleOverview, LeaderDigest,
    ScorecardView, MISSING_AGENCY_LABEL,
};
use crate::reviews::completion::{track_completion, CompletionRow};
use crate::reviews::domain::{
    Agency, AgencyId, Criterion, CriterionId, CycleDraft, CycleId, CycleStatus, Evaluation,
    EvaluationCycle, EvaluationId, EvaluationSubmission, RatingBand, User, UserId,
    SCORE_SCALE_MAX,
};
use crate::reviews::repository::{CycleStore, DirectoryStore, EvaluationStore, RepositoryError};
use crate::reviews::scope::{
    check_submission, ensure_status_transition, validate_cycle_window, visible_cycles,
    CycleConfigError, ScopeError,
};

static CYCLE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_cycle_id() -> CycleId {
    let id = CYCLE_SEQUENCE.fetch_add(1, Ordering::SeqCst);
    CycleId(format!("cycle-{id:04}"))
}

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::SeqCst);
    EvaluationId(format!("eval-{id:06}"))
}

/// Injectable time source so window gating stays deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Coordinates scope checks, score aggregation, completion tracking, and
/// persistence for the peer-review workflow.
pub struct ReviewService<D, C, E> {
    directory: Arc<D>,
    cycles: Arc<C>,
    evaluations: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<D, C, E> ReviewService<D, C, E>
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    pub fn new(directory: Arc<D>, cycles: Arc<C>, evaluations: Arc<E>) -> Self {
        Self::with_clock(directory, cycles, evaluations, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<D>,
        cycles: Arc<C>,
        evaluations: Arc<E>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            cycles,
            evaluations,
            clock,
        }
    }

    /// Creates a cycle from a draft, filling in the standard criteria and
    /// rating scheme where the draft leaves them out. New cycles start
    /// `Active`; the derived open state keeps future-dated ones closed to
    /// submissions until their window begins.
    pub fn create_cycle(&self, draft: CycleDraft) -> Result<EvaluationCycle, ReviewServiceError> {
        validate_cycle_window(&draft.scope, draft.start_date, draft.end_date)?;
        let cycle = EvaluationCycle {
            id: next_cycle_id(),
            name: draft.name,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: CycleStatus::Active,
            scope: draft.scope,
            criteria: draft.criteria.unwrap_or_else(Criterion::standard_set),
            bands: draft.bands.unwrap_or_else(RatingBand::standard_scale),
        };
        self.cycles.insert_cycle(cycle.clone())?;
        info!(cycle = %cycle.id, name = %cycle.name, "evaluation cycle created");
        Ok(cycle)
    }

    /// Replaces a cycle's window, scope, and (when given) scoring scheme.
    /// Status is untouched; use [`Self::set_cycle_status`] for transitions.
    pub fn update_cycle(
        &self,
        cycle_id: &CycleId,
        draft: CycleDraft,
    ) -> Result<EvaluationCycle, ReviewServiceError> {
        let existing = self.require_cycle(cycle_id)?;
        validate_cycle_window(&draft.scope, draft.start_date, draft.end_date)?;
        let updated = EvaluationCycle {
            id: existing.id,
            name: draft.name,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: existing.status,
            scope: draft.scope,
            criteria: draft.criteria.unwrap_or(existing.criteria),
            bands: draft.bands.unwrap_or(existing.bands),
        };
        self.cycles.update_cycle(updated.clone())?;
        Ok(updated)
    }

    pub fn set_cycle_status(
        &self,
        cycle_id: &CycleId,
        next: CycleStatus,
    ) -> Result<EvaluationCycle, ReviewServiceError> {
        let mut cycle = self.require_cycle(cycle_id)?;
        ensure_status_transition(cycle.status, next)?;
        cycle.status = next;
        self.cycles.update_cycle(cycle.clone())?;
        info!(cycle = %cycle.id, status = next.label(), "cycle status changed");
        Ok(cycle)
    }

    /// Records one peer review after running the full submission gate:
    /// window, scope, pairing rules, score validation, then the
    /// one-per-pair uniqueness check at the store.
    pub fn submit_evaluation(
        &self,
        cycle_id: &CycleId,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, ReviewServiceError> {
        let cycle = self.require_cycle(cycle_id)?;
        let evaluator = self.require_user(&submission.evaluator_id)?;
        let evaluatee = self.require_user(&submission.evaluatee_id)?;
        let now = self.clock.now();
        check_submission(&cycle, &evaluator, &evaluatee, now)?;

        if cycle.criteria.is_empty() {
            return Err(ReviewServiceError::CycleNotConfigured(cycle.id));
        }
        for (criterion_id, value) in &submission.scores {
            if !cycle.criteria.iter().any(|criterion| &criterion.id == criterion_id) {
                return Err(ReviewServiceError::UnknownCriterion(criterion_id.clone()));
            }
            if !(0.0..=SCORE_SCALE_MAX).contains(value) {
                return Err(ReviewServiceError::InvalidScore {
                    criterion: criterion_id.clone(),
                    value: *value,
                });
            }
        }
        // Keys are unique and proven to be cycle criteria above, so a length
        // match means every criterion was scored.
        if submission.scores.len() != cycle.criteria.len() {
            return Err(ReviewServiceError::IncompleteScores {
                expected: cycle.criteria.len(),
                found: submission.scores.len(),
            });
        }

        let evaluation = Evaluation {
            id: next_evaluation_id(),
            evaluator_id: evaluator.id,
            evaluatee_id: evaluatee.id,
            cycle_id: cycle.id,
            scores: submission.scores,
            agency_id: evaluator.agency_id,
            submitted_at: now,
        };
        let stored = self
            .evaluations
            .insert_if_absent(evaluation)
            .map_err(|error| match error {
                RepositoryError::Conflict => ReviewServiceError::DuplicateSubmission,
                other => ReviewServiceError::Repository(other),
            })?;
        info!(
            cycle = %stored.cycle_id,
            evaluator = %stored.evaluator_id,
            evaluatee = %stored.evaluatee_id,
            "peer evaluation recorded"
        );
        Ok(stored)
    }

    /// Cycles whose scope covers the agency, in stored order, each with its
    /// derived submission state.
    pub fn visible_cycles(
        &self,
        agency_id: &AgencyId,
    ) -> Result<Vec<CycleOverview>, ReviewServiceError> {
        let agency = self.require_agency(agency_id)?;
        let cycles = self.cycles.cycles()?;
        let now = self.clock.now();
        Ok(visible_cycles(&agency.id, &cycles)
            .into_iter()
            .map(|cycle| cycle_overview(cycle, now))
            .collect())
    }

    pub fn cycle(&self, cycle_id: &CycleId) -> Result<EvaluationCycle, ReviewServiceError> {
        self.require_cycle(cycle_id)
    }

    /// Aggregate and classification for one evaluatee in one cycle. An
    /// evaluatee with no submissions comes back unrated rather than scored
    /// zero.
    pub fn scorecard(
        &self,
        cycle_id: &CycleId,
        evaluatee_id: &UserId,
    ) -> Result<ScorecardView, ReviewServiceError> {
        let cycle = self.require_cycle(cycle_id)?;
        let evaluatee = self.require_user(evaluatee_id)?;
        let evaluations = self.evaluations.for_cycle(&cycle.id)?;
        Ok(scorecard(&cycle, &evaluatee, &evaluations))
    }

    /// Per-reviewer progress for an agency inside the cycle's scope.
    pub fn completion(
        &self,
        cycle_id: &CycleId,
        agency_id: &AgencyId,
    ) -> Result<Vec<CompletionRow>, ReviewServiceError> {
        let cycle = self.require_cycle(cycle_id)?;
        let agency = self.require_agency(agency_id)?;
        if !cycle.scope.includes(&agency.id) {
            return Err(ScopeError::AgencyOutsideScope(agency.id).into());
        }
        let users = self.directory.users_in_agency(&agency.id)?;
        let evaluations = self.evaluations.for_cycle(&cycle.id)?;
        Ok(track_completion(&agency.id, &cycle.id, &users, &evaluations))
    }

    /// The public ranking board for one agency. The agency label degrades to
    /// a placeholder when the directory record is missing, so stale links
    /// keep rendering.
    pub fn board(
        &self,
        cycle_id: &CycleId,
        agency_id: &AgencyId,
    ) -> Result<BoardView, ReviewServiceError> {
        let cycle = self.require_cycle(cycle_id)?;
        if !cycle.scope.includes(agency_id) {
            return Err(ScopeError::AgencyOutsideScope(agency_id.clone()).into());
        }
        let label = self
            .directory
            .agency(agency_id)?
            .map(|agency| agency.name)
            .unwrap_or_else(|| MISSING_AGENCY_LABEL.to_string());
        let users = self.directory.users_in_agency(agency_id)?;
        let evaluations = self.evaluations.for_cycle(&cycle.id)?;
        Ok(agency_board(&cycle, agency_id, &label, &users, &evaluations))
    }

    /// Monitoring digest a leader sees for their agency in one cycle.
    pub fn digest(
        &self,
        cycle_id: &CycleId,
        agency_id: &AgencyId,
    ) -> Result<LeaderDigest, ReviewServiceError> {
        let cycle = self.require_cycle(cycle_id)?;
        let agency = self.require_agency(agency_id)?;
        if !cycle.scope.includes(&agency.id) {
            return Err(ScopeError::AgencyOutsideScope(agency.id).into());
        }
        let users = self.directory.users_in_agency(&agency.id)?;
        let evaluations = self.evaluations.for_cycle(&cycle.id)?;
        Ok(leader_digest(&cycle, &agency.id, &users, &evaluations))
    }

    /// Registers an agency. Re-registering keeps the stored member count so
    /// roster re-imports cannot reset it.
    pub fn add_agency(&self, agency: Agency) -> Result<Agency, ReviewServiceError> {
        let stored = match self.directory.agency(&agency.id)? {
            Some(existing) => Agency {
                employee_count: existing.employee_count,
                ..agency
            },
            None => agency,
        };
        self.directory.upsert_agency(stored.clone())?;
        Ok(stored)
    }

    /// Adds a member to a registered agency and bumps its member count.
    pub fn add_user(&self, user: User) -> Result<User, ReviewServiceError> {
        let agency = self.require_agency(&user.agency_id)?;
        self.directory.insert_user(user.clone())?;
        self.directory.upsert_agency(Agency {
            employee_count: agency.employee_count + 1,
            ..agency
        })?;
        Ok(user)
    }

    /// Removes a member. An account may never remove itself, which keeps at
    /// least the acting administrator alive in the directory.
    pub fn remove_user(&self, actor: &UserId, target: &UserId) -> Result<(), ReviewServiceError> {
        if actor == target {
            return Err(ReviewServiceError::SelfRemoval);
        }
        let user = self.require_user(target)?;
        self.directory.remove_user(target)?;
        if let Some(agency) = self.directory.agency(&user.agency_id)? {
            self.directory.upsert_agency(Agency {
                employee_count: agency.employee_count.saturating_sub(1),
                ..agency
            })?;
        }
        Ok(())
    }

    pub fn agencies(&self) -> Result<Vec<Agency>, ReviewServiceError> {
        Ok(self.directory.agencies()?)
    }

    fn require_cycle(&self, id: &CycleId) -> Result<EvaluationCycle, ReviewServiceError> {
        self.cycles
            .cycle(id)?
            .ok_or_else(|| ReviewServiceError::UnknownCycle(id.clone()))
    }

    fn require_user(&self, id: &UserId) -> Result<User, ReviewServiceError> {
        self.directory
            .user(id)?
            .ok_or_else(|| ReviewServiceError::UnknownUser(id.clone()))
    }

    fn require_agency(&self, id: &AgencyId) -> Result<Agency, ReviewServiceError> {
        self.directory
            .agency(id)?
            .ok_or_else(|| ReviewServiceError::UnknownAgency(id.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error("unknown cycle {0}")]
    UnknownCycle(CycleId),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("unknown agency {0}")]
    UnknownAgency(AgencyId),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Config(#[from] CycleConfigError),
    #[error("cycle {0} has no scoring criteria configured yet")]
    CycleNotConfigured(CycleId),
    #[error("criterion {0} is not part of this cycle")]
    UnknownCriterion(CriterionId),
    #[error("score {value} for criterion {criterion} is outside the 0-100 scale")]
    InvalidScore { criterion: CriterionId, value: f64 },
    #[error("a score is required for every criterion (expected {expected}, found {found})")]
    IncompleteScores { expected: usize, found: usize },
    #[error("this peer has already been rated in this cycle")]
    DuplicateSubmission,
    #[error("an account cannot remove itself")]
    SelfRemoval,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
