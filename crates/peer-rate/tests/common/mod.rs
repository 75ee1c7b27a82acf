//! In-memory store implementations shared by the integration tests. They
//! mirror what a document-store client would provide behind the repository
//! traits.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use peer_rate::reviews::{
    Agency, AgencyId, Clock, CycleId, CycleStore, DirectoryStore, Evaluation, EvaluationCycle,
    EvaluationStore, RepositoryError, ReviewService, User, UserId,
};

#[derive(Default, Clone)]
pub struct MemoryDirectory {
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
pub struct MemoryCycles {
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
pub struct MemoryEvaluations {
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

pub type TestService = ReviewService<MemoryDirectory, MemoryCycles, MemoryEvaluations>;

pub fn build_service(clock: Arc<dyn Clock>) -> (TestService, Arc<MemoryDirectory>) {
    let directory = Arc::new(MemoryDirectory::default());
    let service = ReviewService::with_clock(
        directory.clone(),
        Arc::new(MemoryCycles::default()),
        Arc::new(MemoryEvaluations::default()),
        clock,
    );
    (service, directory)
}
