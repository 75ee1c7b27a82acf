//! Per-reviewer completion progress: every non-admin member of an agency
//! owes one review of every other non-admin member, and leaders watch who
//! still has peers outstanding.

use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{AgencyId, CycleId, Evaluation, User, UserId};

/// Lightweight user reference carried by monitoring views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRef {
    pub id: UserId,
    pub name: String,
}

impl PeerRef {
    fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

/// Progress of one reviewer through their required peer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRow {
    pub evaluator: PeerRef,
    pub required: usize,
    pub done: usize,
    pub missing_peers: Vec<PeerRef>,
    pub is_complete: bool,
    pub percent: u8,
}

/// Compute completion rows for every eligible reviewer in an agency.
///
/// The required set is the complete graph over the agency's non-admin
/// members: everyone reviews everyone else exactly once per cycle. Rows come
/// back sorted worst-progress first so monitoring surfaces stragglers.
pub fn track_completion(
    agency: &AgencyId,
    cycle: &CycleId,
    agency_users: &[User],
    evaluations: &[Evaluation],
) -> Vec<CompletionRow> {
    let participants: Vec<&User> = agency_users
        .iter()
        .filter(|user| &user.agency_id == agency && user.role.takes_part_in_reviews())
        .collect();

    let mut rows = Vec::with_capacity(participants.len());
    for evaluator in &participants {
        let targets: BTreeSet<UserId> = participants
            .iter()
            .filter(|peer| peer.id != evaluator.id)
            .map(|peer| peer.id.clone())
            .collect();

        // De-duplicated and intersected with the live target set, so stale
        // records naming removed users never inflate the count.
        let done_ids: BTreeSet<UserId> = evaluations
            .iter()
            .filter(|evaluation| {
                evaluation.evaluator_id == evaluator.id && &evaluation.cycle_id == cycle
            })
            .map(|evaluation| evaluation.evaluatee_id.clone())
            .filter(|id| targets.contains(id))
            .collect();

        let required = targets.len();
        let done = done_ids.len();
        let missing_peers: Vec<PeerRef> = participants
            .iter()
            .filter(|peer| targets.contains(&peer.id) && !done_ids.contains(&peer.id))
            .map(|peer| PeerRef::of(peer))
            .collect();

        let is_complete = missing_peers.is_empty();
        // 100 is reserved for true completion; partial progress floors and
        // caps at 99 so rounding can never show a premature 100.
        let percent = if is_complete {
            100
        } else {
            (((done * 100) / required) as u8).min(99)
        };

        rows.push(CompletionRow {
            evaluator: PeerRef::of(evaluator),
            required,
            done,
            missing_peers,
            is_complete,
            percent,
        });
    }

    rows.sort_by(|a, b| {
        a.percent
            .cmp(&b.percent)
            .then_with(|| a.evaluator.name.cmp(&b.evaluator.name))
    });
    rows
}
