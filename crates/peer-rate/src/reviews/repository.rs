use crate::reviews::domain::{
    Agency, AgencyId, CycleId, Evaluation, EvaluationCycle, User, UserId,
};

/// Storage failures surfaced by the store traits. Conflict and NotFound are
/// part of the write contracts; Unavailable covers backend outages.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Store for agencies and their members.
pub trait DirectoryStore: Send + Sync {
    fn agency(&self, id: &AgencyId) -> Result<Option<Agency>, RepositoryError>;

    /// Inserts the agency or replaces the stored record with the same id.
    fn upsert_agency(&self, agency: Agency) -> Result<(), RepositoryError>;

    fn agencies(&self) -> Result<Vec<Agency>, RepositoryError>;

    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    fn users_in_agency(&self, agency: &AgencyId) -> Result<Vec<User>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the user id is taken.
    fn insert_user(&self, user: User) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when no such user exists.
    fn remove_user(&self, id: &UserId) -> Result<(), RepositoryError>;
}

/// Store for evaluation cycles.
pub trait CycleStore: Send + Sync {
    fn cycles(&self) -> Result<Vec<EvaluationCycle>, RepositoryError>;

    fn cycle(&self, id: &CycleId) -> Result<Option<EvaluationCycle>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the cycle id is taken.
    fn insert_cycle(&self, cycle: EvaluationCycle) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when no such cycle exists.
    fn update_cycle(&self, cycle: EvaluationCycle) -> Result<(), RepositoryError>;
}

/// Store for submitted evaluations.
pub trait EvaluationStore: Send + Sync {
    /// Stores the evaluation unless one already exists for the same
    /// (evaluator, evaluatee, cycle) key, in which case it fails with
    /// [`RepositoryError::Conflict`] and leaves the stored record untouched.
    /// The check and the write must be atomic with respect to concurrent
    /// submissions of the same key.
    fn insert_if_absent(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;

    fn for_cycle(&self, cycle: &CycleId) -> Result<Vec<Evaluation>, RepositoryError>;
}
