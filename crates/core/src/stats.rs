//! Population statistics and criteria search.
//!
//! Responsibilities:
//! - Whole-population aggregates: counts, mean age, gender distribution and
//!   top-10 condition/medication frequency tables
//! - Cohort percentages ("what share of patients are on X")
//! - Conjunctive criteria search with per-role result shaping: roles with
//!   individual access receive filtered records, aggregate-only roles
//!   receive counts and never the record list

use crate::access::{
    can_access, denied_message, filter_record, profile_redacted_fields, AccessMode,
};
use crate::permissions::profile_for;
use medquery_types::{
    CohortCount, FrequencyEntry, PatientRecord, PopulationStats, QueryData, QueryResult, User,
};
use serde::{Deserialize, Serialize};

/// Frequency tables are cut off after this many entries.
const TOP_N: usize = 10;

/// Conjunctive search criteria. Unset members do not constrain the search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub min_age: Option<u16>,
    pub max_age: Option<u16>,
    /// Exact gender match, case-insensitive.
    pub gender: Option<String>,
    /// Every entry must appear as a case-insensitive substring of some
    /// record condition.
    pub conditions: Vec<String>,
    /// Every entry must appear as a case-insensitive substring of some
    /// record medication.
    pub medications: Vec<String>,
}

impl SearchCriteria {
    /// True when no member constrains the search.
    pub fn is_empty(&self) -> bool {
        self.min_age.is_none()
            && self.max_age.is_none()
            && self.gender.is_none()
            && self.conditions.is_empty()
            && self.medications.is_empty()
    }
}

/// Whether a record satisfies every set criterion.
pub fn matches_criteria(record: &PatientRecord, criteria: &SearchCriteria) -> bool {
    if let Some(min_age) = criteria.min_age {
        if record.age.map_or(true, |age| age < min_age) {
            return false;
        }
    }
    if let Some(max_age) = criteria.max_age {
        if record.age.map_or(true, |age| age > max_age) {
            return false;
        }
    }
    if let Some(gender) = &criteria.gender {
        if !record.gender.eq_ignore_ascii_case(gender) {
            return false;
        }
    }
    let contains_term = |entries: &[String], term: &str| {
        let term = term.to_lowercase();
        entries.iter().any(|entry| entry.to_lowercase().contains(&term))
    };
    if !criteria.conditions.iter().all(|term| contains_term(&record.conditions, term)) {
        return false;
    }
    if !criteria.medications.iter().all(|term| contains_term(&record.medications, term)) {
        return false;
    }
    true
}

/// Compute population statistics for a user.
///
/// Requires aggregate access, independent of individual access. Mean age is
/// taken over records with a known age only — unknown ages are excluded from
/// numerator and denominator, not treated as zero.
pub fn population_stats(user: &User, records: &[PatientRecord]) -> QueryResult {
    let profile = profile_for(user.role);
    let audit = profile_redacted_fields(profile);
    if !can_access(user.role, AccessMode::Aggregate) {
        return QueryResult::refused(user.role, denied_message(user.role))
            .with_redacted_fields(audit);
    }

    let total = records.len();
    let known_ages: Vec<u16> = records.iter().filter_map(|r| r.age).collect();
    let average_age = if known_ages.is_empty() {
        None
    } else {
        let sum: u32 = known_ages.iter().map(|&age| u32::from(age)).sum();
        Some(round1(f64::from(sum) / known_ages.len() as f64))
    };

    let mut genders: Vec<(String, usize)> = Vec::new();
    for record in records {
        match genders.iter_mut().find(|(g, _)| *g == record.gender) {
            Some((_, count)) => *count += 1,
            None => genders.push((record.gender.clone(), 1)),
        }
    }

    let top_conditions = frequency_table(records, |r| &r.conditions, total);
    let top_medications = frequency_table(records, |r| &r.medications, total);

    let stats = PopulationStats {
        total_patients: total,
        average_age,
        gender_distribution: genders,
        top_conditions,
        top_medications,
    };

    QueryResult::answered(user.role, render_stats(&stats))
        .with_data(QueryData::Stats(stats))
        .with_redacted_fields(audit)
}

/// Cohort share answer: how many records match `criteria`, as a percentage
/// of the whole population. `subject` finishes the sentence, e.g. "are on
/// Metformin". Requires aggregate access; never names patients.
pub fn cohort_stats(
    user: &User,
    records: &[PatientRecord],
    criteria: &SearchCriteria,
    subject: &str,
) -> QueryResult {
    let profile = profile_for(user.role);
    let audit = profile_redacted_fields(profile);
    if !can_access(user.role, AccessMode::Aggregate) {
        return QueryResult::refused(user.role, denied_message(user.role))
            .with_redacted_fields(audit);
    }

    let total = records.len();
    let matched = records.iter().filter(|r| matches_criteria(r, criteria)).count();
    let percentage = if total == 0 {
        0.0
    } else {
        round2(matched as f64 / total as f64 * 100.0)
    };

    let message = format!("{matched} of {total} patients ({percentage:.2}%) {subject}.");
    QueryResult::answered(user.role, message)
        .with_data(QueryData::Matches(CohortCount {
            matched,
            total,
            percentage,
        }))
        .with_redacted_fields(audit)
}

/// Criteria search with per-role result shaping.
///
/// Denied only when the user has neither individual nor aggregate access.
/// With individual access the surviving records are projected through the
/// record filter and listed; with aggregate-only access the caller receives
/// counts, never the record list.
pub fn find_by_criteria(
    user: &User,
    records: &[PatientRecord],
    criteria: &SearchCriteria,
) -> QueryResult {
    let profile = profile_for(user.role);
    let audit = profile_redacted_fields(profile);

    let individual = can_access(user.role, AccessMode::Individual);
    let aggregate = can_access(user.role, AccessMode::Aggregate);
    if !individual && !aggregate {
        return QueryResult::refused(user.role, denied_message(user.role))
            .with_redacted_fields(audit);
    }

    if !individual {
        // Aggregate-only roles get count/percentage framing, never a list.
        return cohort_stats(user, records, criteria, "match the criteria");
    }

    let matched: Vec<&PatientRecord> =
        records.iter().filter(|r| matches_criteria(r, criteria)).collect();

    let filtered: Vec<_> = matched
        .iter()
        .filter_map(|record| filter_record(user, record))
        .collect();

    if filtered.is_empty() {
        return QueryResult::answered(user.role, "No patients found matching the specified criteria.")
            .with_data(QueryData::Records(Vec::new()))
            .with_redacted_fields(audit);
    }

    let mut message = format!("Found {} patient(s) matching the criteria:\n", filtered.len());
    for record in &filtered {
        let age_text = record.age.map(|age| format!(", Age: {age}")).unwrap_or_default();
        match &record.name {
            Some(name) => message.push_str(&format!("• {name} (ID: {}{age_text})\n", record.id)),
            None => message.push_str(&format!("• Patient ID: {}{age_text}\n", record.id)),
        }
    }

    QueryResult::answered(user.role, message.trim_end().to_string())
        .with_data(QueryData::Records(filtered))
        .with_redacted_fields(audit)
}

/// Distinct-patient frequency table over a list-valued field, descending by
/// count with first-seen order preserved on ties (stable sort).
fn frequency_table<'a>(
    records: &'a [PatientRecord],
    field: impl Fn(&'a PatientRecord) -> &'a Vec<String>,
    total: usize,
) -> Vec<FrequencyEntry> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let mut seen_in_record: Vec<&str> = Vec::new();
        for entry in field(record) {
            // A duplicate entry within one record must not count twice.
            if seen_in_record.contains(&entry.as_str()) {
                continue;
            }
            seen_in_record.push(entry);
            match counts.iter_mut().find(|(name, _)| name == entry) {
                Some((_, count)) => *count += 1,
                None => counts.push((entry.clone(), 1)),
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_N)
        .map(|(name, count)| FrequencyEntry {
            name,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                round2(count as f64 / total as f64 * 100.0)
            },
        })
        .collect()
}

fn render_stats(stats: &PopulationStats) -> String {
    let mut lines = vec![
        "Population Statistics:".to_string(),
        format!("• Total patients: {}", stats.total_patients),
    ];
    if let Some(average_age) = stats.average_age {
        lines.push(format!("• Average age: {average_age} years"));
    }
    if !stats.gender_distribution.is_empty() {
        let parts: Vec<String> = stats
            .gender_distribution
            .iter()
            .map(|(gender, count)| format!("{gender}: {count}"))
            .collect();
        lines.push(format!("• Gender distribution: {}", parts.join(", ")));
    }
    if !stats.top_conditions.is_empty() {
        lines.push("• Top conditions:".to_string());
        for entry in &stats.top_conditions {
            lines.push(format!(
                "    {} — {} patient(s), {:.2}%",
                entry.name, entry.count, entry.percentage
            ));
        }
    }
    if !stats.top_medications.is_empty() {
        lines.push("• Top medications:".to_string());
        for entry in &stats.top_medications {
            lines.push(format!(
                "    {} — {} patient(s), {:.2}%",
                entry.name, entry.count, entry.percentage
            ));
        }
    }
    lines.join("\n")
}

/// Standard rounding to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Standard rounding to one decimal place, used for mean age.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use medquery_types::{PatientId, Role};

    fn record(id: &str, name: &str, age: Option<u16>, gender: &str) -> PatientRecord {
        PatientRecord {
            id: PatientId::parse(id).expect("valid id"),
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            conditions: Vec::new(),
            medications: Vec::new(),
            notes: String::new(),
            address: String::new(),
            visit_dates: Vec::new(),
        }
    }

    fn sample_population() -> Vec<PatientRecord> {
        let mut jane = record("P001", "Jane Smith", Some(67), "female");
        jane.conditions = vec!["Type 2 Diabetes".to_string(), "Hypertension".to_string()];
        jane.medications = vec!["Metformin".to_string()];
        let mut david = record("P002", "David Chen", Some(42), "male");
        david.conditions = vec!["Asthma".to_string()];
        david.medications = vec!["Albuterol".to_string()];
        let mut maria = record("P003", "Maria Lopez", Some(58), "female");
        maria.conditions = vec!["Hypertension".to_string()];
        maria.medications = vec!["Lisinopril".to_string()];
        vec![jane, david, maria]
    }

    fn user(role: Role) -> User {
        User::new("u1", "Test User", role)
    }

    #[test]
    fn marketing_metformin_percentage_is_33_33() {
        let records = sample_population();
        let criteria = SearchCriteria {
            medications: vec!["metformin".to_string()],
            ..SearchCriteria::default()
        };
        let result = cohort_stats(&user(Role::Marketing), &records, &criteria, "are on Metformin");
        assert!(result.success);
        assert!(result.message.contains("33.33%"), "message: {}", result.message);
        assert!(!result.message.contains("Jane"));
        match result.data {
            Some(QueryData::Matches(cohort)) => {
                assert_eq!(cohort.matched, 1);
                assert_eq!(cohort.total, 3);
                assert_eq!(cohort.percentage, 33.33);
            }
            other => panic!("expected cohort payload, got {other:?}"),
        }
    }

    #[test]
    fn intern_population_stats_is_denied() {
        let result = population_stats(&user(Role::Intern), &sample_population());
        assert!(!result.success);
        assert_eq!(result.message, denied_message(Role::Intern));
    }

    #[test]
    fn average_age_excludes_unknown_ages() {
        let mut records = sample_population();
        records.push(record("P004", "Sam Jones", None, "male"));
        let result = population_stats(&user(Role::Researcher), &records);
        match result.data {
            Some(QueryData::Stats(stats)) => {
                assert_eq!(stats.total_patients, 4);
                // (67 + 42 + 58) / 3, not / 4.
                assert_eq!(stats.average_age, Some(55.7));
            }
            other => panic!("expected stats payload, got {other:?}"),
        }
    }

    #[test]
    fn gender_distribution_is_case_sensitive_as_stored() {
        let mut records = sample_population();
        records.push(record("P005", "Lee Park", Some(30), "Female"));
        let result = population_stats(&user(Role::Doctor), &records);
        match result.data {
            Some(QueryData::Stats(stats)) => {
                assert!(stats.gender_distribution.contains(&("female".to_string(), 2)));
                assert!(stats.gender_distribution.contains(&("Female".to_string(), 1)));
            }
            other => panic!("expected stats payload, got {other:?}"),
        }
    }

    #[test]
    fn frequency_counts_each_patient_once_per_condition() {
        let mut records = sample_population();
        // Duplicate entry within one record must not double count.
        records[0].conditions.push("Hypertension".to_string());
        let result = population_stats(&user(Role::Doctor), &records);
        match result.data {
            Some(QueryData::Stats(stats)) => {
                let hypertension = stats
                    .top_conditions
                    .iter()
                    .find(|e| e.name == "Hypertension")
                    .expect("hypertension entry");
                assert_eq!(hypertension.count, 2);
                assert_eq!(hypertension.percentage, 66.67);
            }
            other => panic!("expected stats payload, got {other:?}"),
        }
    }

    #[test]
    fn frequency_ties_keep_first_seen_order() {
        let records = sample_population();
        let result = population_stats(&user(Role::Doctor), &records);
        match result.data {
            Some(QueryData::Stats(stats)) => {
                // Hypertension (2) first, then the 1-count ties in encounter
                // order: Type 2 Diabetes before Asthma.
                let names: Vec<&str> =
                    stats.top_conditions.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["Hypertension", "Type 2 Diabetes", "Asthma"]);
            }
            other => panic!("expected stats payload, got {other:?}"),
        }
    }

    #[test]
    fn criteria_search_scenario_returns_only_qualifying_record() {
        let records = sample_population();
        let criteria = SearchCriteria {
            min_age: Some(60),
            conditions: vec!["type 2 diabetes".to_string()],
            ..SearchCriteria::default()
        };
        let result = find_by_criteria(&user(Role::Doctor), &records, &criteria);
        assert!(result.success);
        match result.data {
            Some(QueryData::Records(found)) => {
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].name.as_deref(), Some("Jane Smith"));
            }
            other => panic!("expected record payload, got {other:?}"),
        }
    }

    #[test]
    fn each_criterion_disqualifies_independently() {
        let records = sample_population();
        // Age criterion alone drops David (42) and Maria (58).
        let age_only = SearchCriteria { min_age: Some(60), ..SearchCriteria::default() };
        assert!(matches_criteria(&records[0], &age_only));
        assert!(!matches_criteria(&records[1], &age_only));
        assert!(!matches_criteria(&records[2], &age_only));
        // Condition criterion alone drops David and Maria too.
        let condition_only = SearchCriteria {
            conditions: vec!["type 2 diabetes".to_string()],
            ..SearchCriteria::default()
        };
        assert!(matches_criteria(&records[0], &condition_only));
        assert!(!matches_criteria(&records[1], &condition_only));
        assert!(!matches_criteria(&records[2], &condition_only));
    }

    #[test]
    fn unknown_age_fails_age_criteria() {
        let no_age = record("P009", "Ash Grey", None, "other");
        let criteria = SearchCriteria { min_age: Some(10), ..SearchCriteria::default() };
        assert!(!matches_criteria(&no_age, &criteria));
    }

    #[test]
    fn marketing_criteria_search_gets_counts_not_records() {
        let records = sample_population();
        let criteria = SearchCriteria {
            conditions: vec!["hypertension".to_string()],
            ..SearchCriteria::default()
        };
        let result = find_by_criteria(&user(Role::Marketing), &records, &criteria);
        assert!(result.success);
        assert!(matches!(result.data, Some(QueryData::Matches(_))));
        assert!(!result.message.contains("Jane"));
        assert!(!result.message.contains("Maria"));
        assert!(result.message.contains("2 of 3"));
    }

    #[test]
    fn intern_criteria_search_is_denied() {
        let result =
            find_by_criteria(&user(Role::Intern), &sample_population(), &SearchCriteria::default());
        assert!(!result.success);
        assert_eq!(result.message, denied_message(Role::Intern));
    }

    #[test]
    fn researcher_criteria_results_are_anonymised() {
        let records = sample_population();
        let criteria = SearchCriteria { min_age: Some(60), ..SearchCriteria::default() };
        let result = find_by_criteria(&user(Role::Researcher), &records, &criteria);
        assert!(result.message.contains("ANON_P001"));
        assert!(!result.message.contains("Jane Smith"));
    }

    #[test]
    fn empty_population_percentage_is_zero() {
        let result = cohort_stats(
            &user(Role::Doctor),
            &[],
            &SearchCriteria::default(),
            "match the criteria",
        );
        match result.data {
            Some(QueryData::Matches(cohort)) => assert_eq!(cohort.percentage, 0.0),
            other => panic!("expected cohort payload, got {other:?}"),
        }
    }
}
