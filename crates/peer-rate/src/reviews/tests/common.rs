use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::reviews::domain::{
    Agency, AgencyId, Criterion, CriterionId, CycleDraft, CycleId, CycleStatus, Evaluation,
    EvaluationCycle, EvaluationId, EvaluationSubmission, RatingBand, Role, Scope, User, UserId,
};
use crate::reviews::repository::{
    CycleStore, DirectoryStore, EvaluationStore, RepositoryError,
};
use crate::reviews::review_router;
use crate::reviews::service::{Clock, ReviewService, ReviewServiceError};

/// A mid-June instant inside the standard test cycle's window.
pub(super) fn june_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn planning_agency() -> Agency {
    Agency {
        id: AgencyId("agency-planning".to_string()),
        name: "District Planning Office".to_string(),
        employee_count: 0,
        region: Some("Northern".to_string()),
    }
}

pub(super) fn finance_agency() -> Agency {
    Agency {
        id: AgencyId("agency-finance".to_string()),
        name: "Finance Department".to_string(),
        employee_count: 0,
        region: None,
    }
}

pub(super) fn employee(id: &str, name: &str, agency: &str) -> User {
    User {
        id: UserId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@phutho.gov.vn"),
        avatar: None,
        role: Role::Employee,
        agency_id: AgencyId(agency.to_string()),
        department: Some("Operations".to_string()),
        position: Some("Specialist".to_string()),
    }
}

pub(super) fn leader(id: &str, name: &str, agency: &str) -> User {
    User {
        role: Role::Leader,
        position: Some("Head of Office".to_string()),
        ..employee(id, name, agency)
    }
}

pub(super) fn admin(id: &str, name: &str, agency: &str) -> User {
    User {
        role: Role::Admin,
        department: None,
        position: Some("System Administrator".to_string()),
        ..employee(id, name, agency)
    }
}

pub(super) fn criterion(id: &str, name: &str, order: u32) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        description: String::new(),
        order,
    }
}

pub(super) fn band(id: &str, label: &str, min_score: f64, order: u32) -> RatingBand {
    RatingBand {
        id: id.to_string(),
        label: label.to_string(),
        min_score,
        color: "#000000".to_string(),
        order,
    }
}

/// An active cycle covering all agencies for June 2025, carrying the
/// standard criteria and rating scheme.
pub(super) fn june_cycle() -> EvaluationCycle {
    EvaluationCycle {
        id: CycleId("cycle-june".to_string()),
        name: "June 2025 Peer Review".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"),
        status: CycleStatus::Active,
        scope: Scope::AllAgencies,
        criteria: Criterion::standard_set(),
        bands: RatingBand::standard_scale(),
    }
}

pub(super) fn june_draft() -> CycleDraft {
    CycleDraft {
        name: "June 2025 Peer Review".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"),
        scope: Scope::AllAgencies,
        criteria: None,
        bands: None,
    }
}

/// Scores every standard criterion at the same value.
pub(super) fn full_scores(value: f64) -> BTreeMap<CriterionId, f64> {
    Criterion::standard_set()
        .into_iter()
        .map(|criterion| (criterion.id, value))
        .collect()
}

pub(super) fn evaluation(
    id: &str,
    evaluator: &str,
    evaluatee: &str,
    cycle: &str,
    agency: &str,
    scores: BTreeMap<CriterionId, f64>,
) -> Evaluation {
    Evaluation {
        id: EvaluationId(id.to_string()),
        evaluator_id: UserId(evaluator.to_string()),
        evaluatee_id: UserId(evaluatee.to_string()),
        cycle_id: CycleId(cycle.to_string()),
        scores,
        agency_id: AgencyId(agency.to_string()),
        submitted_at: june_now(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    agencies: Arc<Mutex<HashMap<AgencyId, Agency>>>,
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl DirectoryStore for MemoryDirectory {
    fn agency(&self, id: &AgencyId) -> Result<Option<Agency>, RepositoryError> {
        let guard = self.agencies.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn upsert_agency(&self, agency: Agency) -> Result<(), RepositoryError> {
        let mut guard = self.agencies.lock().expect("directory mutex poisoned");
        guard.insert(agency.id.clone(), agency);
        Ok(())
    }

    fn agencies(&self) -> Result<Vec<Agency>, RepositoryError> {
        let guard = self.agencies.lock().expect("directory mutex poisoned");
        let mut agencies: Vec<Agency> = guard.values().cloned().collect();
        agencies.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(agencies)
    }

    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn users_in_agency(&self, agency: &AgencyId) -> Result<Vec<User>, RepositoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        let mut users: Vec<User> = guard
            .values()
            .filter(|user| &user.agency_id == agency)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    fn insert_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        if guard.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user);
        Ok(())
    }

    fn remove_user(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        if guard.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCycles {
    cycles: Arc<Mutex<Vec<EvaluationCycle>>>,
}

impl CycleStore for MemoryCycles {
    fn cycles(&self) -> Result<Vec<EvaluationCycle>, RepositoryError> {
        let guard = self.cycles.lock().expect("cycle mutex poisoned");
        Ok(guard.clone())
    }

    fn cycle(&self, id: &CycleId) -> Result<Option<EvaluationCycle>, RepositoryError> {
        let guard = self.cycles.lock().expect("cycle mutex poisoned");
        Ok(guard.iter().find(|cycle| &cycle.id == id).cloned())
    }

    fn insert_cycle(&self, cycle: EvaluationCycle) -> Result<(), RepositoryError> {
        let mut guard = self.cycles.lock().expect("cycle mutex poisoned");
        if guard.iter().any(|stored| stored.id == cycle.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(cycle);
        Ok(())
    }

    fn update_cycle(&self, cycle: EvaluationCycle) -> Result<(), RepositoryError> {
        let mut guard = self.cycles.lock().expect("cycle mutex poisoned");
        match guard.iter_mut().find(|stored| stored.id == cycle.id) {
            Some(stored) => {
                *stored = cycle;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvaluations {
    records: Arc<Mutex<BTreeMap<(UserId, UserId, CycleId), Evaluation>>>,
}

impl EvaluationStore for MemoryEvaluations {
    fn insert_if_absent(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = self.records.lock().expect("evaluation mutex poisoned");
        let key = evaluation.submission_key();
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, evaluation.clone());
        Ok(evaluation)
    }

    fn for_cycle(&self, cycle: &CycleId) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("evaluation mutex poisoned");
        Ok(guard
            .values()
            .filter(|evaluation| &evaluation.cycle_id == cycle)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableDirectory;

impl DirectoryStore for UnavailableDirectory {
    fn agency(&self, _id: &AgencyId) -> Result<Option<Agency>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_agency(&self, _agency: Agency) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn agencies(&self) -> Result<Vec<Agency>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn user(&self, _id: &UserId) -> Result<Option<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn users_in_agency(&self, _agency: &AgencyId) -> Result<Vec<User>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_user(&self, _user: User) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove_user(&self, _id: &UserId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct ConflictEvaluations;

impl EvaluationStore for ConflictEvaluations {
    fn insert_if_absent(&self, _evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn for_cycle(&self, _cycle: &CycleId) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) type TestService = ReviewService<MemoryDirectory, MemoryCycles, MemoryEvaluations>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryDirectory>,
    Arc<MemoryCycles>,
    Arc<MemoryEvaluations>,
) {
    let directory = Arc::new(MemoryDirectory::default());
    let cycles = Arc::new(MemoryCycles::default());
    let evaluations = Arc::new(MemoryEvaluations::default());
    let service = ReviewService::with_clock(
        directory.clone(),
        cycles.clone(),
        evaluations.clone(),
        Arc::new(FixedClock(june_now())),
    );
    (service, directory, cycles, evaluations)
}

/// A service seeded with two agencies, three planning employees, an
/// administrator, a finance employee, and one open cycle.
pub(super) fn staffed_service() -> (TestService, EvaluationCycle) {
    let (service, _, _, _) = build_service();
    service.add_agency(planning_agency()).expect("agency stored");
    service.add_agency(finance_agency()).expect("agency stored");
    for user in [
        employee("an", "An", "agency-planning"),
        employee("bao", "Bao", "agency-planning"),
        employee("chi", "Chi", "agency-planning"),
        admin("quan", "Quan", "agency-planning"),
        employee("dung", "Dung", "agency-finance"),
    ] {
        service.add_user(user).expect("user stored");
    }
    let cycle = service.create_cycle(june_draft()).expect("cycle created");
    (service, cycle)
}

pub(super) fn rate(
    service: &TestService,
    cycle: &CycleId,
    evaluator: &str,
    evaluatee: &str,
    value: f64,
) -> Result<Evaluation, ReviewServiceError> {
    service.submit_evaluation(
        cycle,
        EvaluationSubmission {
            evaluator_id: UserId(evaluator.to_string()),
            evaluatee_id: UserId(evaluatee.to_string()),
            scores: full_scores(value),
        },
    )
}

pub(super) fn review_router_with_service(service: TestService) -> axum::Router {
    review_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
