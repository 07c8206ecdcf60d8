//! Closed catalog of resources and actions the dashboard asks about.
//! Server grants stay string-keyed; typed requests are rendered to their wire names before matching.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $text),+ }
            }

            /// Exact, case-sensitive lookup of the wire name.
            pub fn parse(s: &str) -> Option<Self> {
                match s { $($text => Some($name::$variant),)+ _ => None }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }
    };
}

string_enum!(
    /// Capability domain guarded by the dashboard.
    Resource {
        Dashboard => "dashboard",
        Attendance => "attendance",
        Reports => "reports",
        Checklists => "checklists",
        Patrols => "patrols",
        Incidents => "incidents",
        Visitors => "visitors",
        Training => "training",
        Employees => "employees",
        Payroll => "payroll",
        MasterData => "master_data",
        Sites => "sites",
        Announcements => "announcements",
        Shifts => "shifts",
        ControlCenter => "control_center",
        Manpower => "manpower",
        PatrolTargets => "patrol_targets",
        PatrolTeams => "patrol_teams",
        Kta => "kta",
        Calendar => "calendar",
        Profile => "profile",
        Panic => "panic",
        Dispatch => "dispatch",
        Dar => "dar",
        Passdown => "passdown",
        Roles => "roles",
    }
);

string_enum!(
    /// Operation on a resource.
    Action {
        Read => "read",
        Write => "write",
        Delete => "delete",
        Approve => "approve",
        Export => "export",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self { Self { resource, action } }

    /// Parse a string pair; `None` when either side is outside the catalog.
    pub fn parse(resource: &str, action: &str) -> Option<Self> {
        Some(Self { resource: Resource::parse(resource)?, action: Action::parse(action)? })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.resource, self.action) }
}

/// A server-asserted (resource, action) pair, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grant {
    pub resource: String,
    pub action: String,
}

impl Grant {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self { resource: resource.into(), action: action.into() }
    }

    pub fn matches(&self, p: Permission) -> bool {
        self.resource == p.resource.as_str() && self.action == p.action.as_str()
    }
}

impl From<Permission> for Grant {
    fn from(p: Permission) -> Self { Grant::new(p.resource.as_str(), p.action.as_str()) }
}
