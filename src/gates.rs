//! Access gates: conditional rendering, route guarding and action suppression.
//! All three share `Criteria` and delegate the actual decision to `PermissionResolver`.

use serde::{Deserialize, Serialize};

use crate::config::AccessConfig;
use crate::identity::{Identity, RoleCategory};
use crate::permissions::{DecisionPolicy, LoadingPolicy, Permission, PermissionResolver};

/// Constraints attached to a piece of UI. Empty lists mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub divisions: Vec<String>,
    #[serde(default)]
    pub permission: Option<Permission>,
}

/// First failing check, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    Role,
    Division,
    Permission,
}

impl Criteria {
    pub fn any() -> Self { Self::default() }

    pub fn permission(p: Permission) -> Self { Self { permission: Some(p), ..Default::default() } }

    pub fn roles<I: IntoIterator<Item = S>, S: Into<String>>(mut self, roles: I) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn divisions<I: IntoIterator<Item = S>, S: Into<String>>(mut self, divisions: I) -> Self {
        self.divisions = divisions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permission(mut self, p: Permission) -> Self {
        self.permission = Some(p);
        self
    }

    /// Role, then division, then permission; the first failure short-circuits.
    /// Role and division lists are plain membership tests; no admin bypass happens here.
    pub fn check(&self, resolver: &PermissionResolver, policy: DecisionPolicy) -> Result<(), Denial> {
        if !self.roles.is_empty() && !resolver.has_any_role(&self.roles) {
            return Err(Denial::Role);
        }
        if !self.divisions.is_empty() && !resolver.in_any_division(&self.divisions) {
            return Err(Denial::Division);
        }
        if let Some(p) = self.permission {
            if !resolver.decide_with(p, policy) { return Err(Denial::Permission); }
        }
        Ok(())
    }

    /// Gate semantics: admin passes unconditionally.
    pub fn admit(&self, resolver: &PermissionResolver, policy: DecisionPolicy) -> Result<(), Denial> {
        if resolver.is_admin() { return Ok(()); }
        self.check(resolver, policy)
    }
}

/// Wraps arbitrary content and renders it, or an optional fallback, depending on the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderGate {
    pub criteria: Criteria,
    /// Render children optimistically while grants load
    pub show_while_loading: bool,
    /// An empty loaded grant set denies instead of using the fallback table
    pub strict: bool,
}

impl RenderGate {
    pub fn new(criteria: Criteria) -> Self { Self { criteria, show_while_loading: true, strict: false } }

    pub fn show_while_loading(mut self, show: bool) -> Self {
        self.show_while_loading = show;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn policy(&self) -> DecisionPolicy {
        let mut policy = DecisionPolicy::default();
        if self.strict { policy = policy.strict(); }
        if !self.show_while_loading { policy = policy.deny_while_loading(); }
        policy
    }

    pub fn allows(&self, resolver: &PermissionResolver) -> bool { self.criteria.admit(resolver, self.policy()).is_ok() }

    /// The content when allowed, otherwise the fallback (which may be nothing).
    pub fn render<T>(&self, resolver: &PermissionResolver, content: T, fallback: Option<T>) -> Option<T> {
        if self.allows(resolver) { Some(content) } else { fallback }
    }
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    /// Grants still loading under a deny-while-loading policy; show a loading state
    Pending,
    Redirect { to: String, reason: RedirectReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    Unauthenticated,
    Forbidden(Denial),
}

/// Guards a route; redirects instead of rendering a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGate {
    pub criteria: Criteria,
    /// Explicit destination for denied (but authenticated) users
    pub redirect_to: Option<String>,
}

impl RouteGate {
    pub fn new(criteria: Criteria) -> Self { Self { criteria, redirect_to: None } }

    pub fn redirect_to(mut self, to: impl Into<String>) -> Self {
        self.redirect_to = Some(to.into());
        self
    }

    /// `authenticated` is whether the session holds a token.
    pub fn check(&self, authenticated: bool, resolver: &PermissionResolver, cfg: &AccessConfig) -> RouteDecision {
        let identity = match resolver.identity() {
            Some(i) if authenticated => i,
            _ => {
                return RouteDecision::Redirect { to: cfg.login_route.clone(), reason: RedirectReason::Unauthenticated };
            }
        };
        let policy = DecisionPolicy { while_loading: cfg.loading_policy, ..resolver.policy() };
        match self.criteria.admit(resolver, policy) {
            Ok(()) => RouteDecision::Allow,
            Err(Denial::Permission) if resolver.is_loading() && cfg.loading_policy == LoadingPolicy::Deny => RouteDecision::Pending,
            Err(denial) => {
                let to = self.redirect_to.clone().unwrap_or_else(|| landing_route(identity, cfg));
                RouteDecision::Redirect { to, reason: RedirectReason::Forbidden(denial) }
            }
        }
    }
}

/// Default landing page for a signed-in identity.
pub fn landing_route(identity: &Identity, cfg: &AccessConfig) -> String {
    match identity.role.category() {
        RoleCategory::Admin | RoleCategory::Supervisor => cfg.supervisor_landing_route.clone(),
        RoleCategory::Field | RoleCategory::Unknown => match identity.division {
            Some(d) => format!("/{}/dashboard", d.as_str()),
            None => cfg.default_route.clone(),
        },
    }
}

/// Wraps an interactive control; a denied control is not rendered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGate {
    pub criteria: Criteria,
}

impl ActionGate {
    pub fn new(criteria: Criteria) -> Self { Self { criteria } }

    pub fn allows(&self, resolver: &PermissionResolver) -> bool { self.criteria.admit(resolver, resolver.policy()).is_ok() }

    pub fn render<T>(&self, resolver: &PermissionResolver, control: T) -> Option<T> {
        self.allows(resolver).then_some(control)
    }
}
