use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use peer_rate::reviews::{
    Agency, AgencyId, CycleId, CycleStore, DirectoryStore, Evaluation, EvaluationCycle,
    EvaluationStore, RepositoryError, User, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Directory of agencies and their members, held in process memory. A
/// document-store client would slot in behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDirectory {
    agencies: Arc<Mutex<HashMap<AgencyId, Agency>>>,
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl DirectoryStore for InMemoryDirectory {
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
        agencies.sort_by(|a, b| a.name.cmp(&b.name));
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
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
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

/// Evaluation cycles in insertion order, so listings keep the order the
/// administrator created them in.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCycles {
    cycles: Arc<Mutex<Vec<EvaluationCycle>>>,
}

impl CycleStore for InMemoryCycles {
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

/// Submitted evaluations keyed by (evaluator, evaluatee, cycle). Holding the
/// map lock across the contains/insert pair is what makes the one-per-pair
/// rule hold under concurrent submissions.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluations {
    records: Arc<Mutex<BTreeMap<(UserId, UserId, CycleId), Evaluation>>>,
}

impl EvaluationStore for InMemoryEvaluations {
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
