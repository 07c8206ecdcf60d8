//! Static per-role permission tables used when the server has not (yet) issued grants.

use std::collections::HashMap;
use once_cell::sync::Lazy;

use super::catalog::{Action, Permission, Resource};
use crate::identity::{Division, RoleCategory};

const RW: &[Action] = &[Action::Read, Action::Write];
const R: &[Action] = &[Action::Read];

const SUPERVISOR_TABLE: &[(Resource, &[Action])] = &[
    (Resource::Dashboard, RW),
    (Resource::Attendance, RW),
    (Resource::Reports, RW),
    (Resource::Checklists, RW),
    (Resource::Patrols, RW),
    (Resource::Incidents, RW),
    (Resource::Visitors, RW),
    (Resource::Training, RW),
    (Resource::Employees, RW),
    (Resource::Payroll, R),
    (Resource::MasterData, RW),
    (Resource::Sites, RW),
    (Resource::Announcements, RW),
    (Resource::Shifts, RW),
    (Resource::ControlCenter, R),
    (Resource::Manpower, R),
    (Resource::PatrolTargets, RW),
    (Resource::PatrolTeams, RW),
    (Resource::Kta, RW),
    (Resource::Calendar, R),
];

const FIELD_TABLE: &[(Resource, &[Action])] = &[
    (Resource::Dashboard, RW),
    (Resource::Attendance, RW),
    (Resource::Reports, RW),
    (Resource::Checklists, RW),
    (Resource::Patrols, RW),
    (Resource::Incidents, RW),
    (Resource::Profile, RW),
    (Resource::Visitors, RW),
    (Resource::Panic, RW),
    (Resource::Dispatch, RW),
    (Resource::Dar, RW),
    (Resource::Passdown, RW),
];

/// Field resources that additionally require the security division, whatever the table says.
pub const SECURITY_ONLY: &[Resource] = &[Resource::Visitors, Resource::Panic, Resource::Dispatch, Resource::Dar, Resource::Passdown];

type Table = HashMap<Resource, &'static [Action]>;

static SUPERVISOR: Lazy<Table> = Lazy::new(|| SUPERVISOR_TABLE.iter().copied().collect());
static FIELD: Lazy<Table> = Lazy::new(|| FIELD_TABLE.iter().copied().collect());

fn table_for(category: RoleCategory) -> Option<&'static Table> {
    match category {
        RoleCategory::Supervisor => Some(&*SUPERVISOR),
        RoleCategory::Field => Some(&*FIELD),
        // Admin never reaches the tables; unknown roles have none
        RoleCategory::Admin | RoleCategory::Unknown => None,
    }
}

/// Whether the category has a fallback table at all.
pub fn has_table(category: RoleCategory) -> bool { table_for(category).is_some() }

/// Static answer for a (role category, division) pair.
pub fn allows(category: RoleCategory, division: Option<Division>, p: Permission) -> bool {
    let Some(table) = table_for(category) else { return false; };
    let listed = table.get(&p.resource).is_some_and(|acts| acts.contains(&p.action));
    if !listed { return false; }
    if category == RoleCategory::Field && SECURITY_ONLY.contains(&p.resource) {
        return division == Some(Division::Security);
    }
    true
}

/// Every permission the table would allow, in catalog order.
pub fn permissions_for(category: RoleCategory, division: Option<Division>) -> Vec<Permission> {
    let mut out = Vec::new();
    for r in Resource::ALL {
        for a in Action::ALL {
            let p = Permission::new(*r, *a);
            if allows(category, division, p) { out.push(p); }
        }
    }
    out
}
