//! Central allow/deny authority.
//!
//! Resource/action checks run in this order:
//! 1. admin role: allow.
//! 2. grants loaded and non-empty: allow iff an exact grant exists; the fallback table is not consulted.
//! 3. grants loaded and empty: fallback table, or deny under `EmptyGrantsPolicy::Deny`.
//! 4. grants loading: fallback table, or deny under `LoadingPolicy::Deny`.
//!
//! A resolver is an immutable snapshot; build a new one when the session or grants change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::Permission;
use super::fallback;
use super::grants::GrantState;
use crate::identity::Identity;

/// Decisions while the grant fetch is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingPolicy {
    /// Answer from the static table to avoid flicker
    #[default]
    Optimistic,
    Deny,
}

impl FromStr for LoadingPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(LoadingPolicy::Optimistic),
            "deny" | "strict" => Ok(LoadingPolicy::Deny),
            other => Err(format!("unknown loading policy '{}'", other)),
        }
    }
}

/// Decisions once grants loaded but the server assigned none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyGrantsPolicy {
    #[default]
    Fallback,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionPolicy {
    pub while_loading: LoadingPolicy,
    pub empty_grants: EmptyGrantsPolicy,
}

impl DecisionPolicy {
    pub fn new(while_loading: LoadingPolicy) -> Self { Self { while_loading, ..Default::default() } }

    /// Empty loaded grant sets deny instead of falling back.
    pub fn strict(mut self) -> Self {
        self.empty_grants = EmptyGrantsPolicy::Deny;
        self
    }

    pub fn deny_while_loading(mut self) -> Self {
        self.while_loading = LoadingPolicy::Deny;
        self
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Admin,
    NoIdentity,
    Grants,
    Fallback,
    DeniedWhileLoading,
    DeniedEmptyGrants,
    UnknownPermission,
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Basis::Admin => "admin",
            Basis::NoIdentity => "no_identity",
            Basis::Grants => "grants",
            Basis::Fallback => "fallback",
            Basis::DeniedWhileLoading => "denied_while_loading",
            Basis::DeniedEmptyGrants => "denied_empty_grants",
            Basis::UnknownPermission => "unknown_permission",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct PermissionResolver {
    identity: Option<Identity>,
    grants: GrantState,
    policy: DecisionPolicy,
}

impl PermissionResolver {
    pub fn new(identity: Option<Identity>, grants: GrantState) -> Self {
        Self { identity, grants, policy: DecisionPolicy::default() }
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecisionPolicy { self.policy }
    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }
    pub fn grants(&self) -> &GrantState { &self.grants }
    pub fn is_loading(&self) -> bool { self.grants.is_loading() }
    pub fn is_admin(&self) -> bool { self.identity.as_ref().is_some_and(|i| i.role.is_admin()) }

    pub fn decide(&self, p: Permission) -> bool { self.explain_with(p, self.policy).0 }

    /// Same as `decide` under an explicit policy (gates pass their own flags).
    pub fn decide_with(&self, p: Permission, policy: DecisionPolicy) -> bool { self.explain_with(p, policy).0 }

    /// String-keyed entry point. Pairs outside the catalog deny for everyone but admin.
    pub fn decide_str(&self, resource: &str, action: &str) -> bool { self.explain_str(resource, action).0 }

    pub fn explain_str(&self, resource: &str, action: &str) -> (bool, Basis) {
        if self.is_admin() { return (true, Basis::Admin); }
        match Permission::parse(resource, action) {
            Some(p) => self.explain(p),
            None => (false, Basis::UnknownPermission),
        }
    }

    pub fn explain(&self, p: Permission) -> (bool, Basis) { self.explain_with(p, self.policy) }

    pub fn explain_with(&self, p: Permission, policy: DecisionPolicy) -> (bool, Basis) {
        let Some(identity) = self.identity.as_ref() else { return (false, Basis::NoIdentity); };
        if identity.role.is_admin() { return (true, Basis::Admin); }
        let fallback = || fallback::allows(identity.role.category(), identity.division, p);
        match &self.grants {
            GrantState::Loaded(set) if !set.is_empty() => (set.contains(p), Basis::Grants),
            GrantState::Loaded(_) => match policy.empty_grants {
                EmptyGrantsPolicy::Fallback => (fallback(), Basis::Fallback),
                EmptyGrantsPolicy::Deny => (false, Basis::DeniedEmptyGrants),
            },
            GrantState::Loading => match policy.while_loading {
                LoadingPolicy::Optimistic => (fallback(), Basis::Fallback),
                LoadingPolicy::Deny => (false, Basis::DeniedWhileLoading),
            },
        }
    }

    /// Case-insensitive membership of the identity's role.
    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(identity) = self.identity.as_ref() else { return false; };
        let mine = identity.role.as_str();
        roles.into_iter().any(|r| r.as_ref().trim().eq_ignore_ascii_case(mine))
    }

    /// Case-insensitive membership of the identity's division. No division never matches.
    pub fn in_any_division<I, S>(&self, divisions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(div) = self.identity.as_ref().and_then(|i| i.division) else { return false; };
        divisions.into_iter().any(|d| d.as_ref().trim().eq_ignore_ascii_case(div.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Division, Role};
    use crate::permissions::{Action, Grant, Resource};

    fn who(role: &str, division: Option<Division>) -> Option<Identity> {
        Some(Identity::new("u1", "tester", Role::parse(role), division))
    }

    fn p(r: Resource, a: Action) -> Permission { Permission::new(r, a) }

    #[test]
    fn admin_allows_everything_even_unknown_strings() {
        for grants in [GrantState::Loading, GrantState::empty(), GrantState::loaded(vec![Grant::new("dashboard", "read")])] {
            let r = PermissionResolver::new(who("admin", None), grants).with_policy(DecisionPolicy::default().strict().deny_while_loading());
            for res in Resource::ALL {
                for act in Action::ALL { assert!(r.decide(p(*res, *act))); }
            }
            assert!(r.decide_str("no_such_page", "fly"));
        }
    }

    #[test]
    fn no_identity_denies() {
        let r = PermissionResolver::new(None, GrantState::Loading);
        assert_eq!(r.explain(p(Resource::Dashboard, Action::Read)), (false, Basis::NoIdentity));
        assert!(!r.has_any_role(["admin"]));
        assert!(!r.in_any_division(["security"]));
    }

    #[test]
    fn loaded_grants_are_used_exclusively() {
        let r = PermissionResolver::new(who("supervisor", None), GrantState::loaded(vec![Grant::new("dashboard", "read")]));
        assert!(r.decide(p(Resource::Dashboard, Action::Read)));
        assert_eq!(r.explain(p(Resource::Reports, Action::Write)), (false, Basis::Grants));
    }

    #[test]
    fn field_visitors_while_loading_depends_on_division() {
        let sec = PermissionResolver::new(who("field", Some(Division::Security)), GrantState::Loading);
        assert_eq!(sec.explain(p(Resource::Visitors, Action::Read)), (true, Basis::Fallback));
        let cln = PermissionResolver::new(who("field", Some(Division::Cleaning)), GrantState::Loading);
        assert!(!cln.decide_str("visitors", "read"));
    }

    #[test]
    fn strict_and_deny_while_loading_policies() {
        let empty = PermissionResolver::new(who("supervisor", None), GrantState::empty());
        let kta_w = p(Resource::Kta, Action::Write);
        assert!(empty.decide(kta_w));
        assert_eq!(empty.explain_with(kta_w, DecisionPolicy::default().strict()), (false, Basis::DeniedEmptyGrants));

        let loading = PermissionResolver::new(who("supervisor", None), GrantState::Loading);
        assert!(loading.decide(kta_w));
        assert!(!loading.decide_with(kta_w, DecisionPolicy::new(LoadingPolicy::Deny)));
        // strict only concerns loaded sets
        assert!(loading.decide_with(kta_w, DecisionPolicy::default().strict()));
    }

    #[test]
    fn unknown_role_and_unknown_strings_deny() {
        let r = PermissionResolver::new(who("auditor", Some(Division::Security)), GrantState::empty());
        assert!(!r.decide(p(Resource::Dashboard, Action::Read)));
        let f = PermissionResolver::new(who("guard", Some(Division::Security)), GrantState::Loading);
        assert!(!f.decide_str("dashboard", "teleport"));
        assert!(!f.decide_str("Dashboard", "read"));
    }

    #[test]
    fn role_and_division_membership_is_case_insensitive() {
        let r = PermissionResolver::new(who("Guard", Some(Division::Parking)), GrantState::Loading);
        assert!(r.has_any_role(["supervisor", "GUARD"]));
        assert!(!r.has_any_role(Vec::<String>::new()));
        assert!(r.in_any_division(vec!["Parking".to_string()]));
        assert!(!r.in_any_division(["security", "cleaning"]));
        let nodiv = PermissionResolver::new(who("supervisor", None), GrantState::Loading);
        assert!(!nodiv.in_any_division(["security"]));
    }

    #[test]
    fn loading_policy_parses() {
        assert_eq!("Optimistic".parse::<LoadingPolicy>(), Ok(LoadingPolicy::Optimistic));
        assert_eq!(" strict ".parse::<LoadingPolicy>(), Ok(LoadingPolicy::Deny));
        assert!("maybe".parse::<LoadingPolicy>().is_err());
    }
}
