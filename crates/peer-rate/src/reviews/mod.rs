//! Peer-review core: cycle visibility and submission gating, score
//! aggregation and rating classification, completion tracking, the views
//! built on them, and the HTTP surface.

pub mod board;
pub mod completion;
pub mod domain;
pub mod repository;
pub mod router;
pub(crate) mod scope;
pub(crate) mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use board::{
    agency_board, cycle_overview, leader_digest, scorecard, BoardRow, BoardView, CriterionAverage,
    CycleOverview, LeaderDigest, RatingDistributionEntry, ScorecardView, TopPerformer,
    MISSING_AGENCY_LABEL,
};
pub use completion::{track_completion, CompletionRow, PeerRef};
pub use domain::{
    Agency, AgencyId, Criterion, CriterionId, CycleDraft, CycleId, CycleStatus, Evaluation,
    EvaluationCycle, EvaluationId, EvaluationSubmission, RatingBand, Role, Scope, User, UserId,
    SCORE_SCALE_MAX,
};
pub use repository::{CycleStore, DirectoryStore, EvaluationStore, RepositoryError};
pub use router::review_router;
pub use scope::{
    check_submission, open_state, visible_cycles, CycleConfigError, CycleOpenState, ScopeError,
};
pub use scoring::{aggregate, classify, ScoreSummary};
pub use service::{Clock, ReviewService, ReviewServiceError, SystemClock};
