//! Static role-to-permission table.
//!
//! One fixed [`PermissionProfile`] per [`Role`], resolved by an exhaustive
//! match so the table is total over the role enum at compile time. Profiles
//! never change at runtime; an unrecognised role cannot occur.

use medquery_types::{Field, Role};

/// What a role may see and do.
///
/// `allowed_fields` governs the coarse field set for record projection.
/// `can_view_identifying` is an orthogonal, stricter override: when false,
/// name and address are stripped from every projection even if present in
/// `allowed_fields`, and ids are anonymised. The override always wins.
#[derive(Clone, Copy, Debug)]
pub struct PermissionProfile {
    pub allowed_fields: &'static [Field],
    pub can_view_individual: bool,
    pub can_view_identifying: bool,
    pub can_view_aggregate: bool,
}

const DOCTOR: PermissionProfile = PermissionProfile {
    allowed_fields: &Field::ALL,
    can_view_individual: true,
    can_view_identifying: true,
    can_view_aggregate: true,
};

const RESEARCHER: PermissionProfile = PermissionProfile {
    allowed_fields: &[
        Field::Id,
        Field::Age,
        Field::Gender,
        Field::Conditions,
        Field::Medications,
        Field::Notes,
        Field::VisitDates,
    ],
    can_view_individual: true,
    can_view_identifying: false,
    can_view_aggregate: true,
};

const MARKETING: PermissionProfile = PermissionProfile {
    allowed_fields: &[
        Field::Id,
        Field::Age,
        Field::Gender,
        Field::Conditions,
        Field::Medications,
    ],
    can_view_individual: false,
    can_view_identifying: false,
    can_view_aggregate: true,
};

const INTERN: PermissionProfile = PermissionProfile {
    allowed_fields: &[],
    can_view_individual: false,
    can_view_identifying: false,
    can_view_aggregate: false,
};

/// Look up the permission profile for a role.
///
/// Pure, constant-time and total: every role variant maps to exactly one
/// profile and there is no fallback path that could silently widen access.
pub fn profile_for(role: Role) -> &'static PermissionProfile {
    match role {
        Role::Doctor => &DOCTOR,
        Role::Researcher => &RESEARCHER,
        Role::Marketing => &MARKETING,
        Role::Intern => &INTERN,
    }
}
