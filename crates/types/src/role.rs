//! Roles and users.
//!
//! A [`Role`] determines data visibility throughout the system. Roles are
//! supplied by the caller per session and are never verified here —
//! authentication is out of scope by design.

use serde::{Deserialize, Serialize};

/// The closed set of caller roles.
///
/// Every role maps to exactly one permission profile in `medquery-core`;
/// adding a variant here is a compile error there until the profile table is
/// extended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Treating clinician: full record access.
    Doctor,
    /// De-identified record access for research use.
    Researcher,
    /// Aggregate statistics only, no per-record detail.
    Marketing,
    /// No data access without supervision.
    Intern,
}

impl Role {
    /// All roles, in a fixed order. Useful for capability listings and for
    /// startup assertions that the permission table is total.
    pub const ALL: [Role; 4] = [Role::Doctor, Role::Researcher, Role::Marketing, Role::Intern];

    /// Stable lowercase name, matching the serialised form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Researcher => "researcher",
            Role::Marketing => "marketing",
            Role::Intern => "intern",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    /// Case-insensitive parse, for CLI and session input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "researcher" => Ok(Role::Researcher),
            "marketing" => Ok(Role::Marketing),
            "intern" => Ok(Role::Intern),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A session user. Created once per session and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Caller-supplied identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role determining data visibility.
    pub role: Role,
}

impl User {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}
