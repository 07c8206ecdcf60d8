use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Coarse access tier. Field-variant strings the dashboard does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Supervisor,
    SuperAdmin,
    Field,
    Guard,
    Cleaner,
    Driver,
    Other(String),
}

/// Grouping used by the static fallback tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleCategory {
    Admin,
    Supervisor,
    Field,
    Unknown,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "supervisor" => Role::Supervisor,
            "super_admin" => Role::SuperAdmin,
            "field" => Role::Field,
            "guard" => Role::Guard,
            "cleaner" => Role::Cleaner,
            "driver" => Role::Driver,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::SuperAdmin => "super_admin",
            Role::Field => "field",
            Role::Guard => "guard",
            Role::Cleaner => "cleaner",
            Role::Driver => "driver",
            Role::Other(s) => s.as_str(),
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Role::Admin => RoleCategory::Admin,
            Role::Supervisor | Role::SuperAdmin => RoleCategory::Supervisor,
            Role::Field | Role::Guard | Role::Cleaner | Role::Driver => RoleCategory::Field,
            Role::Other(_) => RoleCategory::Unknown,
        }
    }

    pub fn is_admin(&self) -> bool { matches!(self, Role::Admin) }
}

impl From<String> for Role {
    fn from(s: String) -> Self { Role::parse(&s) }
}

impl From<Role> for String {
    fn from(r: Role) -> Self { r.as_str().to_string() }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Operational department of a field user; orthogonal to role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Security,
    Cleaning,
    Driver,
    Parking,
}

impl Division {
    pub const ALL: [Division; 4] = [Division::Security, Division::Cleaning, Division::Driver, Division::Parking];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "security" => Some(Division::Security),
            "cleaning" => Some(Division::Cleaning),
            "driver" => Some(Division::Driver),
            "parking" => Some(Division::Parking),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Security => "security",
            Division::Cleaning => "cleaning",
            Division::Driver => "driver",
            Division::Parking => "parking",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// Unknown or empty division strings from the backend are treated as "no division".
fn lenient_division<'de, D>(de: D) -> Result<Option<Division>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(Division::parse))
}

/// The authenticated user as seen by the access layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    #[serde(alias = "id", alias = "userId")]
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(default, deserialize_with = "lenient_division")]
    pub division: Option<Division>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, role: Role, division: Option<Division>) -> Self {
        Self { user_id: user_id.into(), username: username.into(), role, division }
    }
}
