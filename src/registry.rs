//! Access-controlled record registry
//!
//! A thread-safe store of [`Record`]s keyed by [`Identity`]. Each identity may
//! register at most once. Depending on the [`RegistryMode`], either every
//! caller registers themselves or only the admin fixed at construction may
//! register on behalf of others.
//!
//! Lookups are total: an unknown identity yields the zero-value record rather
//! than an error.

use crate::capability::Capability;
use crate::error::{LabError, Result};
use crate::identity::Identity;
use crate::persistence::{load_snapshot, save_snapshot, update_snapshot, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A single field value stored in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Uint(u64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Uint(_) => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            FieldValue::Uint(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Uint(n)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Build a field map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub owner: Identity,
    pub fields: Fields,
    pub registered: bool,
}

impl Record {
    /// The zero-value record returned for identities that never registered.
    pub fn empty(owner: Identity) -> Self {
        Record {
            owner,
            fields: Fields::new(),
            registered: false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryMode {
    /// Callers register themselves.
    SelfService,
    /// Only the admin registers, naming an explicit target.
    AdminManaged,
}

impl RegistryMode {
    fn capability(&self) -> Capability {
        match self {
            RegistryMode::SelfService => Capability::SelfOnly,
            RegistryMode::AdminManaged => Capability::AdminOnly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryInner {
    admin: Identity,
    mode: RegistryMode,
    records: HashMap<Identity, Record>,
}

/// Thread-safe registry handle. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl RegistryInner {
    fn new(admin: Identity, mode: RegistryMode) -> Self {
        RegistryInner {
            admin,
            mode,
            records: HashMap::new(),
        }
    }
}

impl Registry {
    /// Create an empty registry. `admin` is fixed for the registry's lifetime.
    pub fn new(admin: Identity, mode: RegistryMode) -> Self {
        Registry::from_inner(RegistryInner::new(admin, mode))
    }

    fn from_inner(inner: RegistryInner) -> Self {
        Registry {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Self-service registration: `caller` registers their own record.
    pub fn register(&self, caller: Identity, fields: Fields) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.mode != RegistryMode::SelfService {
            return Err(LabError::NotAuthorized);
        }
        Self::insert_checked(&mut inner, caller, caller, fields)
    }

    /// Admin-managed registration: the admin registers `target`.
    pub fn register_for(&self, caller: Identity, target: Identity, fields: Fields) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.mode != RegistryMode::AdminManaged {
            return Err(LabError::NotAuthorized);
        }
        Self::insert_checked(&mut inner, caller, target, fields)
    }

    // Capability, uniqueness and insert run under the caller's write guard.
    fn insert_checked(
        inner: &mut RegistryInner,
        caller: Identity,
        target: Identity,
        fields: Fields,
    ) -> Result<()> {
        inner.mode.capability().check(&caller, &target, &inner.admin)?;

        if inner.records.contains_key(&target) {
            return Err(LabError::AlreadyRegistered);
        }

        inner.records.insert(
            target,
            Record {
                owner: target,
                fields,
                registered: true,
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.inner
            .read()
            .records
            .get(identity)
            .is_some_and(|r| r.registered)
    }

    /// Return the record for `identity`, or the zero-value record if unknown.
    pub fn get_record(&self, identity: &Identity) -> Record {
        self.inner
            .read()
            .records
            .get(identity)
            .cloned()
            .unwrap_or_else(|| Record::empty(*identity))
    }

    /// All records sorted by owner.
    pub fn records(&self) -> Vec<Record> {
        let inner = self.inner.read();
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| a.owner.cmp(&b.owner));
        records
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn admin(&self) -> Identity {
        self.inner.read().admin
    }

    pub fn mode(&self) -> RegistryMode {
        self.inner.read().mode
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let inner = self.inner.read();
        save_snapshot(store, key, &*inner)
    }

    /// Load a registry snapshot, or create a fresh one if nothing is stored under `key`.
    pub fn load_or_new(
        store: &dyn KeyValueStore,
        key: &str,
        admin: Identity,
        mode: RegistryMode,
    ) -> Result<Self> {
        match load_snapshot::<RegistryInner>(store, key)? {
            Some(inner) => Ok(Registry::from_inner(inner)),
            None => Ok(Registry::new(admin, mode)),
        }
    }

    /// Run `op` against the registry stored under `key` and write the result
    /// back in one store transaction. A rejected `op` writes nothing.
    pub fn update_stored<R>(
        store: &dyn KeyValueStore,
        key: &str,
        admin: Identity,
        mode: RegistryMode,
        op: impl FnOnce(&Registry) -> Result<R>,
    ) -> Result<R> {
        update_snapshot(
            store,
            key,
            || RegistryInner::new(admin, mode),
            |stored: &mut RegistryInner| {
                let registry = Registry::from_inner(stored.clone());
                let outcome = op(&registry)?;
                *stored = registry.inner.read().clone();
                Ok(outcome)
            },
        )
    }
}
