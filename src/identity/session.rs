use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use crate::tprintln;

use super::principal::Identity;

pub type SessionToken = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub identity: Identity,
    pub established_at: DateTime<Utc>,
    /// Epoch of the store when this session was installed
    pub epoch: u64,
}

/// Holder of the current identity and bearer token.
/// Passed explicitly to whoever needs it; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Arc<Session>>>,
    epoch: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    /// Replace token and identity together. Returns the new session epoch.
    pub fn set_auth(&self, token: impl Into<SessionToken>, identity: Identity) -> u64 {
        let mut slot = self.current.write();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tprintln!("session.set_auth user={} role={} epoch={}", identity.username, identity.role, epoch);
        *slot = Some(Arc::new(Session { token: token.into(), identity, established_at: Utc::now(), epoch }));
        epoch
    }

    /// Remove token and identity. Returns the new session epoch.
    pub fn clear(&self) -> u64 {
        let mut slot = self.current.write();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(prev) = slot.take() {
            tprintln!("session.clear user={} epoch={}", prev.identity.username, epoch);
        }
        epoch
    }

    pub fn current(&self) -> Option<Arc<Session>> { self.current.read().clone() }

    pub fn identity(&self) -> Option<Identity> { self.current.read().as_ref().map(|s| s.identity.clone()) }

    pub fn token(&self) -> Option<SessionToken> { self.current.read().as_ref().map(|s| s.token.clone()) }

    pub fn is_authenticated(&self) -> bool { self.current.read().is_some() }

    pub fn epoch(&self) -> u64 { self.epoch.load(Ordering::SeqCst) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Division, Role};

    fn guard() -> Identity { Identity::new("7", "budi", Role::Guard, Some(Division::Security)) }

    #[test]
    fn starts_empty() {
        let s = SessionStore::new();
        assert!(!s.is_authenticated());
        assert!(s.identity().is_none());
        assert!(s.token().is_none());
        assert_eq!(s.epoch(), 0);
    }

    #[test]
    fn set_auth_replaces_wholesale_and_bumps_epoch() {
        let s = SessionStore::new();
        let e1 = s.set_auth("tok-1", guard());
        let e2 = s.set_auth("tok-2", Identity::new("8", "sari", Role::Supervisor, None));
        assert!(e2 > e1);
        let cur = s.current().unwrap();
        assert_eq!(cur.token, "tok-2");
        assert_eq!(cur.identity.username, "sari");
        assert_eq!(cur.identity.division, None);
        assert_eq!(cur.epoch, e2);
    }

    #[test]
    fn clear_removes_both() {
        let s = SessionStore::new();
        let e1 = s.set_auth("tok", guard());
        let e2 = s.clear();
        assert!(e2 > e1);
        assert!(!s.is_authenticated());
        assert!(s.token().is_none());
        // clearing twice is harmless
        assert!(s.clear() > e2);
    }
}
