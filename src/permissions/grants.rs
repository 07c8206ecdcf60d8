use std::collections::HashSet;
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::debug;

use super::catalog::{Grant, Permission};

/// Grant set as last delivered by the server. Duplicates collapse; order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSet {
    grants: HashSet<Grant>,
}

impl GrantSet {
    pub fn new<I: IntoIterator<Item = Grant>>(grants: I) -> Self { Self { grants: grants.into_iter().collect() } }

    pub fn is_empty(&self) -> bool { self.grants.is_empty() }
    pub fn len(&self) -> usize { self.grants.len() }

    pub fn contains(&self, p: Permission) -> bool { self.grants.iter().any(|g| g.matches(p)) }

    /// Raw string lookup, used for pairs outside the typed catalog.
    pub fn contains_raw(&self, resource: &str, action: &str) -> bool {
        self.grants.iter().any(|g| g.resource == resource && g.action == action)
    }
}

impl FromIterator<Grant> for GrantSet {
    fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self { GrantSet::new(iter) }
}

/// What the resolver knows about the current session's grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantState {
    /// Fetch in flight (or not yet started for this identity)
    Loading,
    /// Fetch resolved; a failed fetch resolves to an empty set
    Loaded(Arc<GrantSet>),
}

impl GrantState {
    pub fn loaded<I: IntoIterator<Item = Grant>>(grants: I) -> Self { GrantState::Loaded(Arc::new(GrantSet::new(grants))) }
    pub fn empty() -> Self { GrantState::Loaded(Arc::new(GrantSet::default())) }
    pub fn is_loading(&self) -> bool { matches!(self, GrantState::Loading) }
}

#[derive(Debug)]
struct Slot {
    epoch: u64,
    state: GrantState,
}

/// Single-writer holder of the grant state, tagged with the session epoch it belongs to.
#[derive(Debug)]
pub struct GrantStore {
    slot: RwLock<Slot>,
}

impl Default for GrantStore {
    fn default() -> Self { Self { slot: RwLock::new(Slot { epoch: 0, state: GrantState::Loading }) } }
}

impl GrantStore {
    pub fn new() -> Self { Self::default() }

    /// Enter the loading state for a newer session epoch. Ignored for epochs the slot
    /// has already reached, including one whose fetch has already completed.
    pub fn begin(&self, epoch: u64) {
        let mut s = self.slot.write();
        if epoch <= s.epoch {
            return;
        }
        s.epoch = epoch;
        s.state = GrantState::Loading;
    }

    /// Install a fetch result unless it was issued for an older epoch. Returns false when discarded.
    /// Epochs only move forward.
    pub fn complete(&self, epoch: u64, grants: GrantSet) -> bool {
        let mut s = self.slot.write();
        if epoch < s.epoch {
            debug!(issued_for = epoch, current = s.epoch, "discarding stale grant response");
            return false;
        }
        s.epoch = epoch;
        s.state = GrantState::Loaded(Arc::new(grants));
        true
    }

    pub fn snapshot(&self) -> GrantState { self.slot.read().state.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{Action, Resource};

    #[test]
    fn duplicates_collapse() {
        let set = GrantSet::new(vec![Grant::new("kta", "read"), Grant::new("kta", "read"), Grant::new("kta", "write")]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::new(Resource::Kta, Action::Write)));
        assert!(set.contains_raw("kta", "read"));
        assert!(!set.contains_raw("KTA", "read"));
    }

    #[test]
    fn starts_loading_and_completes_for_current_epoch() {
        let store = GrantStore::new();
        assert!(store.snapshot().is_loading());
        store.begin(3);
        assert!(store.complete(3, GrantSet::new(vec![Grant::new("dashboard", "read")])));
        match store.snapshot() {
            GrantState::Loaded(set) => assert_eq!(set.len(), 1),
            GrantState::Loading => panic!("expected loaded"),
        }
    }

    #[test]
    fn stale_response_is_discarded() {
        let store = GrantStore::new();
        store.begin(1);
        store.begin(2);
        assert!(!store.complete(1, GrantSet::new(vec![Grant::new("payroll", "write")])));
        assert!(store.snapshot().is_loading());
        assert!(store.complete(2, GrantSet::default()));
        assert_eq!(store.snapshot(), GrantState::empty());
    }

    #[test]
    fn completion_before_begin_survives_the_late_begin() {
        // session moved to epoch 2 and its fetch resolved before begin(2) ran
        let store = GrantStore::new();
        store.begin(1);
        assert!(store.complete(2, GrantSet::new(vec![Grant::new("dashboard", "read")])));
        store.begin(2);
        assert_eq!(store.snapshot(), GrantState::loaded(vec![Grant::new("dashboard", "read")]));

        // an older epoch can neither reset nor overwrite
        store.begin(1);
        assert!(!store.complete(1, GrantSet::default()));
        assert!(!store.snapshot().is_loading());

        store.begin(3);
        assert!(store.snapshot().is_loading());
    }
}
