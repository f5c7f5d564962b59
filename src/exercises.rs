//! Small open-access stores: a greeting, a single profile and a counter.
//!
//! Anyone may call every operation here, so none of them takes a caller.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GreetingStore {
    greeting: Arc<RwLock<String>>,
}

impl GreetingStore {
    pub fn new(initial: impl Into<String>) -> Self {
        GreetingStore {
            greeting: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn greeting(&self) -> String {
        self.greeting.read().clone()
    }

    pub fn set_greeting(&self, text: impl Into<String>) {
        *self.greeting.write() = text.into();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profile: Arc<RwLock<Profile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Profile {
        self.profile.read().clone()
    }

    /// Overwrite name and age together.
    pub fn set_profile(&self, name: impl Into<String>, age: u64) {
        *self.profile.write() = Profile {
            name: name.into(),
            age,
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Add one, saturating at `u64::MAX`. Returns the new count.
    pub fn increment(&self) -> u64 {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_add(1)))
            .unwrap_or(u64::MAX);
        previous.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_updates() {
        let store = GreetingStore::new("Hello, World!");
        assert_eq!(store.greeting(), "Hello, World!");

        store.set_greeting("Welcome to Blockchain!");
        assert_eq!(store.greeting(), "Welcome to Blockchain!");

        store.set_greeting("");
        assert_eq!(store.greeting(), "");

        store.set_greeting("Hello 世界! 🌍 🚀");
        assert_eq!(store.greeting(), "Hello 世界! 🌍 🚀");
    }

    #[test]
    fn test_profile_overwrite() {
        let store = ProfileStore::new();
        assert_eq!(store.profile(), Profile::default());

        store.set_profile("Charlie Brown", 35);
        assert_eq!(store.profile(), Profile { name: "Charlie Brown".into(), age: 35 });

        store.set_profile("", 0);
        assert_eq!(store.profile(), Profile::default());
    }

    #[test]
    fn test_counter_concurrent_increments() {
        use std::thread;

        let counter = Counter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.count(), 800);
    }

    #[test]
    fn test_counter_returns_new_value() {
        let counter = Counter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.count(), 2);
    }
}
