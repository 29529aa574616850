//! Individual patient summaries.
//!
//! Renders the *filtered* view of a record into a multi-line, human-readable
//! summary. Fields absent from the filtered view are omitted entirely —
//! never rendered as blanks or placeholders, which would leak the fact that
//! a value exists.

use crate::access::{denied_message, filter_record, redacted_fields};
use crate::permissions::profile_for;
use medquery_types::{PatientRecord, PatientSummary, QueryData, QueryResult, User};

/// Marker appended when a summary is shortened to a maximum length.
const ELLIPSIS: char = '…';

/// Summarise one patient for one user.
///
/// Denies via access control when the role has no individual access; the
/// denial carries the role-specific reason and the full redacted-field audit
/// list. `max_len` optionally truncates the rendered text (plain character
/// truncation on the final string, with a trailing ellipsis).
pub fn summarize_patient(
    user: &User,
    record: &PatientRecord,
    max_len: Option<usize>,
) -> QueryResult {
    let profile = profile_for(user.role);
    let audit = redacted_fields(record, profile);

    let Some(filtered) = filter_record(user, record) else {
        return QueryResult::refused(user.role, denied_message(user.role))
            .with_redacted_fields(audit);
    };

    let mut lines: Vec<String> = Vec::new();

    match filtered.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => lines.push(format!("Patient: {name}")),
        None => lines.push(format!("Patient ID: {}", filtered.id)),
    }

    let demographics: Vec<String> = [
        filtered.age.map(|age| format!("{age} years old")),
        filtered.gender.clone().filter(|g| !g.is_empty()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !demographics.is_empty() {
        lines.push(format!("Demographics: {}", demographics.join(", ")));
    }

    if let Some(conditions) = filtered.conditions.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("Conditions: {}", conditions.join(", ")));
    }
    if let Some(medications) = filtered.medications.as_deref().filter(|m| !m.is_empty()) {
        lines.push(format!("Current Medications: {}", medications.join(", ")));
    }
    if let Some(notes) = filtered.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("Clinical Notes: {notes}"));
    }
    if let Some(visits) = filtered.visit_dates.as_deref().filter(|v| !v.is_empty()) {
        // ISO dates order lexicographically, so max is the most recent.
        if let Some(most_recent) = visits.iter().max() {
            lines.push(format!(
                "Visit History: {} visits, most recent on {most_recent}",
                visits.len()
            ));
        }
    }
    if let Some(address) = filtered.address.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("Address: {address}"));
    }

    let (text, truncated) = truncate(lines.join("\n"), max_len);

    QueryResult::answered(user.role, text.clone())
        .with_data(QueryData::Summary(PatientSummary { text, truncated }))
        .with_redacted_fields(audit)
}

/// Plain character-count truncation with a trailing ellipsis marker.
fn truncate(text: String, max_len: Option<usize>) -> (String, bool) {
    let Some(max_len) = max_len else {
        return (text, false);
    };
    if text.chars().count() <= max_len {
        return (text, false);
    }
    let mut shortened: String = text.chars().take(max_len.saturating_sub(1)).collect();
    shortened.push(ELLIPSIS);
    (shortened, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medquery_types::{Field, PatientId, Role};

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
            visit_dates: vec!["2026-03-14".to_string(), "2025-11-02".to_string()],
        }
    }

    fn user(role: Role) -> User {
        User::new("u1", "Test User", role)
    }

    #[test]
    fn doctor_summary_contains_identifying_detail() {
        let result = summarize_patient(&user(Role::Doctor), &jane(), None);
        assert!(result.success);
        assert!(result.message.contains("Jane Smith"));
        assert!(result.message.contains("67"));
        assert!(result.message.contains("Type 2 Diabetes"));
        assert!(result.message.contains("123 Main St"));
        assert_eq!(result.redacted_fields.expect("audit list"), vec![]);
    }

    #[test]
    fn researcher_summary_is_anonymised() {
        let result = summarize_patient(&user(Role::Researcher), &jane(), None);
        assert!(result.success);
        assert!(result.message.contains("ANON_P001"));
        assert!(result.message.contains("Metformin"));
        assert!(!result.message.contains("Jane Smith"));
        assert!(!result.message.contains("123 Main St"));
        let audit = result.redacted_fields.expect("audit list");
        assert!(audit.contains(&Field::Name));
        assert!(audit.contains(&Field::Address));
    }

    #[test]
    fn intern_summary_is_denied_with_supervision_text() {
        let result = summarize_patient(&user(Role::Intern), &jane(), None);
        assert!(!result.success);
        assert_eq!(result.message, denied_message(Role::Intern));
        assert!(result.data.is_none());
    }

    #[test]
    fn visit_line_reports_count_and_most_recent() {
        let result = summarize_patient(&user(Role::Doctor), &jane(), None);
        assert!(result.message.contains("2 visits, most recent on 2026-03-14"));
    }

    #[test]
    fn absent_fields_are_omitted_not_blank() {
        let mut record = jane();
        record.notes = String::new();
        record.visit_dates.clear();
        let result = summarize_patient(&user(Role::Doctor), &record, None);
        assert!(!result.message.contains("Clinical Notes"));
        assert!(!result.message.contains("Visit History"));
    }

    #[test]
    fn unknown_age_is_omitted_from_demographics() {
        let mut record = jane();
        record.age = None;
        let result = summarize_patient(&user(Role::Doctor), &record, None);
        assert!(result.message.contains("Demographics: female"));
        assert!(!result.message.contains("years old"));
    }

    #[test]
    fn truncation_appends_ellipsis_and_sets_flag() {
        let result = summarize_patient(&user(Role::Doctor), &jane(), Some(40));
        assert!(result.success);
        assert_eq!(result.message.chars().count(), 40);
        assert!(result.message.ends_with('…'));
        match result.data {
            Some(QueryData::Summary(summary)) => assert!(summary.truncated),
            other => panic!("expected summary payload, got {other:?}"),
        }
    }

    #[test]
    fn short_summary_is_not_truncated() {
        let result = summarize_patient(&user(Role::Doctor), &jane(), Some(10_000));
        match result.data {
            Some(QueryData::Summary(summary)) => assert!(!summary.truncated),
            other => panic!("expected summary payload, got {other:?}"),
        }
    }
}
