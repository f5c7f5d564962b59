//! Candidate ballot with one vote per identity
//!
//! Candidates are addressed by their insertion index. Names carry no
//! uniqueness constraint: two candidates may share a name and are still
//! distinct entries.

use crate::capability::Capability;
use crate::error::{LabError, Result};
use crate::identity::Identity;
use crate::persistence::{load_snapshot, save_snapshot, update_snapshot, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub vote_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BallotInner {
    admin: Identity,
    candidates: Vec<Candidate>,
    voters: HashSet<Identity>,
}

/// Thread-safe ballot handle. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Ballot {
    inner: Arc<RwLock<BallotInner>>,
}

impl BallotInner {
    fn new(admin: Identity) -> Self {
        BallotInner {
            admin,
            candidates: Vec::new(),
            voters: HashSet::new(),
        }
    }
}

impl Ballot {
    pub fn new(admin: Identity) -> Self {
        Ballot::from_inner(BallotInner::new(admin))
    }

    fn from_inner(inner: BallotInner) -> Self {
        Ballot {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Append a candidate with zero votes and return its index. Admin only.
    pub fn add_candidate(&self, caller: Identity, name: impl Into<String>) -> Result<usize> {
        let mut inner = self.inner.write();
        Capability::AdminOnly.check(&caller, &caller, &inner.admin)?;

        let index = inner.candidates.len();
        inner.candidates.push(Candidate {
            name: name.into(),
            vote_count: 0,
        });
        Ok(index)
    }

    /// Cast `caller`'s single vote for the candidate at `index`.
    pub fn vote(&self, caller: Identity, index: usize) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.voters.contains(&caller) {
            return Err(LabError::AlreadyVoted);
        }

        let total = inner.candidates.len();
        let candidate = inner
            .candidates
            .get_mut(index)
            .ok_or(LabError::InvalidCandidate { index, total })?;

        candidate.vote_count = candidate.vote_count.saturating_add(1);
        inner.voters.insert(caller);
        Ok(())
    }

    /// Snapshot of every candidate with its current vote count, in index order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.inner.read().candidates.clone()
    }

    pub fn candidate(&self, index: usize) -> Option<Candidate> {
        self.inner.read().candidates.get(index).cloned()
    }

    pub fn total_candidates(&self) -> usize {
        self.inner.read().candidates.len()
    }

    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.inner.read().voters.contains(identity)
    }

    pub fn total_votes(&self) -> u64 {
        self.inner
            .read()
            .candidates
            .iter()
            .map(|c| c.vote_count)
            .sum()
    }

    /// Indices of the candidates holding the highest vote count.
    /// Empty while no votes have been cast; ties return every leader.
    pub fn leaders(&self) -> Vec<usize> {
        let inner = self.inner.read();
        let max = inner.candidates.iter().map(|c| c.vote_count).max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }
        inner
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.vote_count == max)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn admin(&self) -> Identity {
        self.inner.read().admin
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let inner = self.inner.read();
        save_snapshot(store, key, &*inner)
    }

    pub fn load_or_new(store: &dyn KeyValueStore, key: &str, admin: Identity) -> Result<Self> {
        match load_snapshot::<BallotInner>(store, key)? {
            Some(inner) => Ok(Ballot::from_inner(inner)),
            None => Ok(Ballot::new(admin)),
        }
    }

    /// Run `op` against the ballot stored under `key` and write the result
    /// back in one store transaction. A rejected `op` writes nothing.
    pub fn update_stored<R>(
        store: &dyn KeyValueStore,
        key: &str,
        admin: Identity,
        op: impl FnOnce(&Ballot) -> Result<R>,
    ) -> Result<R> {
        update_snapshot(
            store,
            key,
            || BallotInner::new(admin),
            |stored: &mut BallotInner| {
                let ballot = Ballot::from_inner(stored.clone());
                let outcome = op(&ballot)?;
                *stored = ballot.inner.read().clone();
                Ok(outcome)
            },
        )
    }
}
