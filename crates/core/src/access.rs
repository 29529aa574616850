//! Capability checks and field-level redaction.
//!
//! Responsibilities:
//! - Answer "may this role perform individual/aggregate queries"
//! - Project a full [`PatientRecord`] onto the role's allowed fields
//! - Apply the identifying-information override (name/address stripping and
//!   id anonymisation) after the projection, so it always wins
//! - Report which fields were withheld, for audit text in every result

use crate::permissions::{profile_for, PermissionProfile};
use medquery_types::{Field, FilteredRecord, PatientRecord, Role, User, ANONYMOUS_ID_PREFIX};

/// The two query capability classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Per-record detail: summaries, lookups, record listings.
    Individual,
    /// Population-level output: counts, averages, frequency tables.
    Aggregate,
}

/// Whether `role` may perform queries of the given mode.
pub fn can_access(role: Role, mode: AccessMode) -> bool {
    let profile = profile_for(role);
    match mode {
        AccessMode::Individual => profile.can_view_individual,
        AccessMode::Aggregate => profile.can_view_aggregate,
    }
}

/// Role-specific denial text, surfaced verbatim as the reason in denial
/// results.
pub fn denied_message(role: Role) -> &'static str {
    match role {
        Role::Intern => {
            "Access to patient data requires supervision. Please contact your supervisor for assistance."
        }
        Role::Marketing => {
            "Access is limited to aggregated statistics. Individual patient records are not available to the marketing role."
        }
        Role::Doctor | Role::Researcher => {
            "Access denied. You don't have permission for this type of query."
        }
    }
}

/// Project a record onto the requesting user's permission profile.
///
/// Returns `None` when the role has no individual access at all. Otherwise
/// the record is projected onto `allowed_fields`; when the role may not view
/// identifying information, name and address are stripped unconditionally
/// (even if allow-listed) and the id is replaced with an `ANON_`-prefixed
/// form. Filtering an already-filtered projection under the same role would
/// change nothing further.
pub fn filter_record(user: &User, record: &PatientRecord) -> Option<FilteredRecord> {
    let profile = profile_for(user.role);
    if !profile.can_view_individual {
        return None;
    }

    let allowed = |field: Field| profile.allowed_fields.contains(&field);
    let identifying = profile.can_view_identifying;

    let id = if identifying {
        record.id.to_string()
    } else {
        format!("{ANONYMOUS_ID_PREFIX}{}", record.id)
    };

    Some(FilteredRecord {
        id,
        name: (allowed(Field::Name) && identifying).then(|| record.name.clone()),
        age: allowed(Field::Age).then_some(record.age).flatten(),
        gender: allowed(Field::Gender).then(|| record.gender.clone()),
        conditions: allowed(Field::Conditions).then(|| record.conditions.clone()),
        medications: allowed(Field::Medications).then(|| record.medications.clone()),
        notes: allowed(Field::Notes).then(|| record.notes.clone()),
        address: (allowed(Field::Address) && identifying).then(|| record.address.clone()),
        visit_dates: allowed(Field::VisitDates).then(|| record.visit_dates.clone()),
    })
}

/// Fields the profile may see in a record projection.
///
/// Empty when the profile has no individual access. The id is always visible
/// to roles with individual access (anonymisation transforms it, it is not
/// withheld).
pub fn visible_fields(profile: &PermissionProfile) -> Vec<Field> {
    if !profile.can_view_individual {
        return Vec::new();
    }
    profile
        .allowed_fields
        .iter()
        .copied()
        .filter(|field| {
            profile.can_view_identifying || !matches!(field, Field::Name | Field::Address)
        })
        .collect()
}

/// The profile-level complement of [`visible_fields`], for audit reporting
/// on results that do not concern a single record (aggregates, denials with
/// no target record, fallback answers).
pub fn profile_redacted_fields(profile: &PermissionProfile) -> Vec<Field> {
    let visible = visible_fields(profile);
    Field::ALL
        .into_iter()
        .filter(|field| !visible.contains(field))
        .collect()
}

/// Fields present on `record` but absent from the profile's filtered view.
///
/// Used purely for audit/explanatory reporting. When individual access is
/// fully denied this is every field present on the record; an unset optional
/// age does not count as present.
pub fn redacted_fields(record: &PatientRecord, profile: &PermissionProfile) -> Vec<Field> {
    let visible = visible_fields(profile);
    Field::ALL
        .into_iter()
        .filter(|field| match field {
            Field::Age => record.age.is_some(),
            _ => true,
        })
        .filter(|field| !visible.contains(field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medquery_types::PatientId;

    fn jane() -> PatientRecord {
        PatientRecord {
            id: PatientId::parse("P001").expect("valid id"),
            name: "Jane Smith".to_string(),
            age: Some(67),
            gender: "female".to_string(),
            conditions: vec!["Type 2 Diabetes".to_string(), "Hypertension".to_string()],
            medications: vec!["Metformin".to_string()],
            notes: "Stable on current regimen.".to_string(),
            address: "123 Main St".to_string(),
            visit_dates: vec!["2025-11-02".to_string(), "2026-03-14".to_string()],
        }
    }

    fn user(role: Role) -> User {
        User::new("u1", "Test User", role)
    }

    #[test]
    fn doctor_view_keeps_identifying_fields() {
        let filtered = filter_record(&user(Role::Doctor), &jane()).expect("doctor has access");
        assert_eq!(filtered.id, "P001");
        assert_eq!(filtered.name.as_deref(), Some("Jane Smith"));
        assert_eq!(filtered.address.as_deref(), Some("123 Main St"));
        assert_eq!(filtered.age, Some(67));
    }

    #[test]
    fn researcher_view_is_anonymised() {
        let filtered = filter_record(&user(Role::Researcher), &jane()).expect("researcher access");
        assert_eq!(filtered.id, "ANON_P001");
        assert!(filtered.name.is_none());
        assert!(filtered.address.is_none());
        assert_eq!(filtered.age, Some(67));
        assert_eq!(
            filtered.conditions.as_deref(),
            Some(&["Type 2 Diabetes".to_string(), "Hypertension".to_string()][..])
        );
    }

    #[test]
    fn marketing_and_intern_get_no_record_view() {
        assert!(filter_record(&user(Role::Marketing), &jane()).is_none());
        assert!(filter_record(&user(Role::Intern), &jane()).is_none());
    }

    #[test]
    fn projection_stays_within_allowed_fields() {
        for role in Role::ALL {
            let profile = profile_for(role);
            let Some(filtered) = filter_record(&user(role), &jane()) else {
                continue;
            };
            let allowed = |f: Field| profile.allowed_fields.contains(&f);
            assert!(filtered.name.is_none() || allowed(Field::Name));
            assert!(filtered.age.is_none() || allowed(Field::Age));
            assert!(filtered.gender.is_none() || allowed(Field::Gender));
            assert!(filtered.conditions.is_none() || allowed(Field::Conditions));
            assert!(filtered.medications.is_none() || allowed(Field::Medications));
            assert!(filtered.notes.is_none() || allowed(Field::Notes));
            assert!(filtered.address.is_none() || allowed(Field::Address));
            assert!(filtered.visit_dates.is_none() || allowed(Field::VisitDates));
        }
    }

    #[test]
    fn identifying_override_beats_allow_list() {
        // A hypothetical profile that allow-lists name/address but may not
        // view identifying information must still have them stripped.
        let profile = PermissionProfile {
            allowed_fields: &Field::ALL,
            can_view_individual: true,
            can_view_identifying: false,
            can_view_aggregate: true,
        };
        let visible = visible_fields(&profile);
        assert!(!visible.contains(&Field::Name));
        assert!(!visible.contains(&Field::Address));
    }

    #[test]
    fn redacted_fields_for_researcher_name_and_address() {
        let redacted = redacted_fields(&jane(), profile_for(Role::Researcher));
        assert_eq!(redacted, vec![Field::Name, Field::Address]);
    }

    #[test]
    fn redacted_fields_on_full_denial_is_every_field() {
        let redacted = redacted_fields(&jane(), profile_for(Role::Intern));
        assert_eq!(redacted.len(), Field::ALL.len());
    }

    #[test]
    fn unset_age_is_not_reported_as_redacted() {
        let mut record = jane();
        record.age = None;
        let redacted = redacted_fields(&record, profile_for(Role::Intern));
        assert!(!redacted.contains(&Field::Age));
        assert_eq!(redacted.len(), Field::ALL.len() - 1);
    }

    #[test]
    fn denial_messages_are_role_specific() {
        assert!(denied_message(Role::Intern).contains("supervision"));
        assert!(denied_message(Role::Marketing).contains("aggregated statistics"));
        assert_eq!(denied_message(Role::Doctor), denied_message(Role::Researcher));
    }

    #[test]
    fn capability_checks_follow_profiles() {
        assert!(can_access(Role::Doctor, AccessMode::Individual));
        assert!(can_access(Role::Marketing, AccessMode::Aggregate));
        assert!(!can_access(Role::Marketing, AccessMode::Individual));
        assert!(!can_access(Role::Intern, AccessMode::Aggregate));
    }
}
