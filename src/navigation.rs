//! The dashboard's static navigation tree.

use crate::menu::MenuNode;
use crate::permissions::{Action, Permission, Resource};

const SUPERVISOR_ROLES: &[&str] = &["supervisor", "super_admin"];
const FIELD_ROLES: &[&str] = &["field", "guard", "cleaner", "driver"];

fn read(r: Resource) -> Permission { Permission::new(r, Action::Read) }
fn write(r: Resource) -> Permission { Permission::new(r, Action::Write) }

fn supervisor_section() -> MenuNode {
    let base = "/supervisor";
    let item = |label: &str, slug: &str, p: Permission| MenuNode::new(label, format!("{}/{}", base, slug)).grant(p);
    MenuNode::new("Supervisor", base).roles(SUPERVISOR_ROLES).children(vec![
        item("Dashboard", "dashboard", read(Resource::Dashboard)),
        item("Control Center", "control-center", read(Resource::ControlCenter)),
        MenuNode::new("Attendance", format!("{}/attendance", base)).children(vec![
            item("Daily Attendance", "attendance/daily", read(Resource::Attendance)),
            item("Shifts", "attendance/shifts", read(Resource::Shifts)),
            item("Manpower", "attendance/manpower", read(Resource::Manpower)),
        ]),
        MenuNode::new("Operations", format!("{}/operations", base)).children(vec![
            item("Patrols", "operations/patrols", read(Resource::Patrols)),
            item("Patrol Targets", "operations/patrol-targets", read(Resource::PatrolTargets)),
            item("Patrol Teams", "operations/patrol-teams", read(Resource::PatrolTeams)),
            item("Checklists", "operations/checklists", read(Resource::Checklists)),
            item("Incidents", "operations/incidents", read(Resource::Incidents)),
            item("Visitors", "operations/visitors", read(Resource::Visitors)),
            item("Reports", "operations/reports", read(Resource::Reports)),
        ]),
        MenuNode::new("People", format!("{}/people", base)).children(vec![
            item("Employees", "people/employees", read(Resource::Employees)),
            item("Training", "people/training", read(Resource::Training)),
            item("Payroll", "people/payroll", read(Resource::Payroll)),
            item("KTA Cards", "people/kta", read(Resource::Kta)),
        ]),
        MenuNode::new("Master Data", format!("{}/master-data", base)).children(vec![
            item("Sites", "master-data/sites", read(Resource::Sites)),
            item("General", "master-data/general", write(Resource::MasterData)),
        ]),
        item("Announcements", "announcements", read(Resource::Announcements)),
        item("Calendar", "calendar", read(Resource::Calendar)),
    ])
}

fn admin_section() -> MenuNode {
    MenuNode::new("Administration", "/admin").roles(&["admin"]).children(vec![
        MenuNode::new("Dashboard", "/admin/dashboard"),
        MenuNode::new("Users", "/admin/users"),
        MenuNode::new("Roles & Permissions", "/admin/roles").grant(write(Resource::Roles)),
        MenuNode::new("Master Data", "/admin/master-data").grant(write(Resource::MasterData)),
        MenuNode::new("KTA Generator", "/admin/kta").grant(write(Resource::Kta)),
        MenuNode::new("Calendar", "/admin/calendar").grant(write(Resource::Calendar)),
    ])
}

fn division_section(division: &str, label: &str) -> MenuNode {
    let base = format!("/{}", division);
    let item = |label: &str, slug: &str, p: Permission| MenuNode::new(label, format!("{}/{}", base, slug)).grant(p);
    let mut children = vec![
        item("Dashboard", "dashboard", read(Resource::Dashboard)),
        item("Attendance", "attendance", write(Resource::Attendance)),
        item("Checklists", "checklists", write(Resource::Checklists)),
        item("Patrols", "patrols", write(Resource::Patrols)),
        item("Incidents", "incidents", write(Resource::Incidents)),
        item("Reports", "reports", write(Resource::Reports)),
    ];
    if division == "security" {
        // Security-only tools; the fallback table also gates these on division
        children.extend([
            item("Visitors", "visitors", write(Resource::Visitors)),
            item("Panic Button", "panic", write(Resource::Panic)),
            item("Dispatch", "dispatch", read(Resource::Dispatch)),
            item("Daily Activity Report", "dar", write(Resource::Dar)),
            item("Passdown", "passdown", write(Resource::Passdown)),
        ]);
    }
    children.push(item("Profile", "profile", read(Resource::Profile)));
    MenuNode::new(label, base.clone()).roles(FIELD_ROLES).divisions(&[division]).children(children)
}

/// Full navigation tree; filter it with `menu::filter_menu` before rendering.
pub fn dashboard_menu() -> Vec<MenuNode> {
    vec![
        admin_section(),
        supervisor_section(),
        division_section("security", "Security"),
        division_section("cleaning", "Cleaning"),
        division_section("driver", "Driver"),
        division_section("parking", "Parking"),
    ]
}
