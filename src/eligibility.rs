//! Threshold-based eligibility gate
//!
//! `check_eligibility` always compares against the current threshold, so an
//! admin update takes effect for the very next check.

use crate::capability::Capability;
use crate::error::Result;
use crate::identity::Identity;
use crate::persistence::{load_snapshot, save_snapshot, update_snapshot, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_MIN_AGE: u64 = 18;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct GateInner {
    admin: Identity,
    threshold: u64,
}

#[derive(Debug, Clone)]
pub struct EligibilityGate {
    inner: Arc<RwLock<GateInner>>,
}

impl EligibilityGate {
    pub fn new(admin: Identity, threshold: u64) -> Self {
        EligibilityGate {
            inner: Arc::new(RwLock::new(GateInner { admin, threshold })),
        }
    }

    /// Replace the threshold. Admin only; any value, including zero, is accepted.
    pub fn update_threshold(&self, caller: Identity, new_value: u64) -> Result<()> {
        let mut inner = self.inner.write();
        Capability::AdminOnly.check(&caller, &caller, &inner.admin)?;
        inner.threshold = new_value;
        Ok(())
    }

    pub fn check_eligibility(&self, value: u64) -> bool {
        value >= self.inner.read().threshold
    }

    pub fn threshold(&self) -> u64 {
        self.inner.read().threshold
    }

    pub fn admin(&self) -> Identity {
        self.inner.read().admin
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let inner = *self.inner.read();
        save_snapshot(store, key, &inner)
    }

    pub fn load_or_new(
        store: &dyn KeyValueStore,
        key: &str,
        admin: Identity,
        threshold: u64,
    ) -> Result<Self> {
        let inner = load_snapshot::<GateInner>(store, key)?.unwrap_or(GateInner { admin, threshold });
        Ok(EligibilityGate {
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// Run `op` against the gate stored under `key` and write the result back
    /// in one store transaction. A rejected `op` writes nothing.
    pub fn update_stored<R>(
        store: &dyn KeyValueStore,
        key: &str,
        admin: Identity,
        threshold: u64,
        op: impl FnOnce(&EligibilityGate) -> Result<R>,
    ) -> Result<R> {
        update_snapshot(
            store,
            key,
            || GateInner { admin, threshold },
            |stored: &mut GateInner| {
                let gate = EligibilityGate {
                    inner: Arc::new(RwLock::new(*stored)),
                };
                let outcome = op(&gate)?;
                *stored = *gate.inner.read();
                Ok(outcome)
            },
        )
    }
}
