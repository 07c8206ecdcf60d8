//! Wiring of session store, grant store and profile source.
//!
//! `AccessContext` is built once by the host and passed to whoever needs decisions.
//! Login installs the identity, puts grants into the loading state and starts the
//! grant fetch; a fetch installs grants for the epoch it was issued under and is
//! discarded if the session changed in the meantime.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AccessConfig;
use crate::error::{AppError, AppResult};
use crate::gates::{RouteDecision, RouteGate};
use crate::identity::{Identity, ProfileSource, Session, SessionStore};
use crate::menu::{filter_menu, MenuNode};
use crate::permissions::{DecisionPolicy, GrantSet, GrantStore, PermissionResolver};

pub struct AccessContext {
    config: AccessConfig,
    sessions: Arc<SessionStore>,
    grants: Arc<GrantStore>,
    source: Arc<dyn ProfileSource>,
}

impl AccessContext {
    pub fn new(config: AccessConfig, sessions: Arc<SessionStore>, source: Arc<dyn ProfileSource>) -> Self {
        Self { config, sessions, grants: Arc::new(GrantStore::new()), source }
    }

    pub fn config(&self) -> &AccessConfig { &self.config }
    pub fn sessions(&self) -> &Arc<SessionStore> { &self.sessions }

    /// Install a freshly authenticated user and start fetching its grants on the tokio runtime.
    /// Decisions use the fallback tables until the returned task resolves.
    pub fn login(self: &Arc<Self>, token: impl Into<String>, identity: Identity) -> JoinHandle<bool> {
        self.install(token, identity);
        self.spawn_refresh()
    }

    fn install(&self, token: impl Into<String>, identity: Identity) -> u64 {
        info!(user = %identity.username, role = %identity.role, division = ?identity.division, "login");
        let epoch = self.sessions.set_auth(token, identity);
        self.grants.begin(epoch);
        epoch
    }

    /// Restore a session from a stored token: the profile endpoint supplies identity and grants in one call.
    pub async fn resume(&self, token: &str) -> AppResult<Arc<Session>> {
        let profile = match self.source.fetch_profile(token).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "session resume failed");
                self.logout();
                return Err(e.into());
            }
        };
        let Some(user) = profile.user else {
            self.logout();
            return Err(AppError::auth("missing_user", "profile response carried no user"));
        };
        let epoch = self.install(token, user);
        self.grants.complete(epoch, GrantSet::new(profile.permissions));
        self.sessions.current().ok_or_else(|| AppError::internal("session_lost", "session cleared during resume"))
    }

    pub fn logout(&self) {
        let epoch = self.sessions.clear();
        // nothing to fetch for an empty session; park grants on the new epoch
        self.grants.begin(epoch);
        info!(epoch, "logout");
    }

    /// Fetch grants for the current session. Failures load an empty set so the fallback tables apply.
    /// Returns false when there is no session or the response arrived for a superseded session.
    pub async fn refresh_grants(&self) -> bool {
        let Some(session) = self.sessions.current() else {
            debug!("grant refresh skipped: no session");
            return false;
        };
        let set = match self.source.fetch_profile(&session.token).await {
            Ok(profile) => GrantSet::new(profile.permissions),
            Err(e) => {
                warn!(user = %session.identity.username, error = %e, "grant fetch failed; using fallback permissions");
                GrantSet::default()
            }
        };
        let count = set.len();
        let applied = self.grants.complete(session.epoch, set);
        if applied {
            debug!(user = %session.identity.username, grants = count, "grants loaded");
        }
        applied
    }

    /// Run `refresh_grants` on the tokio runtime.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<bool> {
        let ctx = Arc::clone(self);
        tokio::spawn(async move { ctx.refresh_grants().await })
    }

    /// Immutable decision snapshot of the current session and grants.
    pub fn resolver(&self) -> PermissionResolver {
        PermissionResolver::new(self.sessions.identity(), self.grants.snapshot())
            .with_policy(DecisionPolicy::new(self.config.loading_policy))
    }

    pub fn visible_menu(&self, tree: &[MenuNode]) -> Vec<MenuNode> { filter_menu(tree, &self.resolver()) }

    pub fn guard_route(&self, gate: &RouteGate) -> RouteDecision {
        gate.check(self.sessions.is_authenticated(), &self.resolver(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Division, FetchError, Profile, Role};
    use crate::permissions::{Action, Grant, Permission, Resource};
    use futures_util::future::{BoxFuture, FutureExt};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StubSource {
        by_token: Mutex<HashMap<String, Result<Profile, FetchError>>>,
    }

    impl StubSource {
        fn answer(&self, token: &str, r: Result<Profile, FetchError>) { self.by_token.lock().insert(token.to_string(), r); }
    }

    impl ProfileSource for StubSource {
        fn fetch_profile<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Profile, FetchError>> {
            let r = self.by_token.lock().get(token).cloned().unwrap_or(Err(FetchError::Status(401)));
            async move { r }.boxed()
        }
    }

    fn supervisor() -> Identity { Identity::new("2", "sari", Role::Supervisor, None) }

    fn ctx(source: Arc<StubSource>) -> Arc<AccessContext> {
        Arc::new(AccessContext::new(AccessConfig::default(), Arc::new(SessionStore::new()), source))
    }

    #[tokio::test]
    async fn login_then_refresh_switches_to_server_grants() {
        let src = Arc::new(StubSource::default());
        src.answer("t1", Ok(Profile { user: None, permissions: vec![Grant::new("kta", "read")] }));
        let c = ctx(src);
        let fetch = c.login("t1", supervisor());
        let kta_w = Permission::new(Resource::Kta, Action::Write);
        assert!(c.resolver().is_loading());
        assert!(c.resolver().decide(kta_w));
        assert!(fetch.await.unwrap());
        assert!(!c.resolver().decide(kta_w));
        assert!(c.resolver().decide(Permission::new(Resource::Kta, Action::Read)));
    }

    #[tokio::test]
    async fn failed_fetch_loads_empty_and_falls_back() {
        let src = Arc::new(StubSource::default());
        src.answer("t1", Err(FetchError::Transport("connection refused".into())));
        let c = ctx(src);
        let _ = c.login("t1", Identity::new("3", "budi", Role::Field, Some(Division::Security)));
        assert!(c.refresh_grants().await);
        let r = c.resolver();
        assert!(!r.is_loading());
        assert!(r.decide_str("visitors", "read"));
        assert!(!r.decide_str("payroll", "read"));
    }

    #[tokio::test]
    async fn login_fetches_grants_without_explicit_refresh() {
        let src = Arc::new(StubSource::default());
        src.answer("t1", Ok(Profile { user: None, permissions: vec![Grant::new("dashboard", "read")] }));
        let c = ctx(src);
        let _ = c.login("t1", supervisor());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let r = c.resolver();
        assert!(!r.is_loading());
        assert!(r.decide(Permission::new(Resource::Dashboard, Action::Read)));
        assert!(!r.decide(Permission::new(Resource::Kta, Action::Write)));
    }

    #[tokio::test]
    async fn refresh_for_superseded_session_is_discarded() {
        let src = Arc::new(StubSource::default());
        src.answer("old", Ok(Profile { user: None, permissions: vec![Grant::new("payroll", "write")] }));
        let c = ctx(src);
        let _ = c.login("old", supervisor());
        let stale = c.sessions().current().unwrap();
        let _ = c.login("new", Identity::new("4", "dewi", Role::Cleaner, Some(Division::Cleaning)));
        // simulate the old request resolving late
        assert!(!c.grants.complete(stale.epoch, GrantSet::new(vec![Grant::new("payroll", "write")])));
        assert!(c.resolver().is_loading());
        assert!(!c.resolver().decide_str("payroll", "write"));
    }

    #[tokio::test]
    async fn resume_installs_profile_user_and_grants() {
        let src = Arc::new(StubSource::default());
        src.answer("saved", Ok(Profile { user: Some(supervisor()), permissions: vec![Grant::new("dashboard", "read")] }));
        let c = ctx(src);
        let session = c.resume("saved").await.unwrap();
        assert_eq!(session.identity.username, "sari");
        let r = c.resolver();
        assert!(r.decide_str("dashboard", "read"));
        assert!(!r.decide_str("reports", "write"));

        let err = c.resume("expired").await.unwrap_err();
        assert_eq!(err.http_status(), 401);
        assert!(!c.sessions().is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_session_and_guards_redirect_to_login() {
        let src = Arc::new(StubSource::default());
        let c = ctx(src);
        assert!(c.login("t1", supervisor()).await.unwrap());
        c.logout();
        assert!(!c.refresh_grants().await);
        let gate = RouteGate::new(crate::gates::Criteria::any().roles(["supervisor"]));
        assert!(matches!(c.guard_route(&gate), RouteDecision::Redirect { ref to, .. } if to == "/login"));
        assert!(c.visible_menu(&crate::navigation::dashboard_menu()).is_empty());
    }
}
