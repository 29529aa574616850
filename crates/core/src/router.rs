//! Query routing.
//!
//! The router is the orchestrator: it classifies raw text, dispatches to the
//! summariser/aggregator under access control, and assembles the final
//! [`QueryResult`]. It is also the only component aware of the optional AI
//! delegate; the rule-based path never depends on whether one is configured.

use crate::access::{
    can_access, denied_message, filter_record, profile_redacted_fields, AccessMode,
};
use crate::classify::{classify, ClassifiedQuery, Intent};
use crate::delegate::QueryDelegate;
use crate::permissions::profile_for;
use crate::stats::{cohort_stats, find_by_criteria, population_stats, SearchCriteria};
use crate::summary::summarize_patient;
use medquery_types::{PatientRecord, QueryResult, Role, User};

/// Dispatches classified queries and assembles results.
///
/// Holds no mutable state; one router may serve any number of concurrent
/// callers. The active user is owned by the caller and passed per query.
#[derive(Default)]
pub struct QueryRouter {
    delegate: Option<Box<dyn QueryDelegate>>,
}

impl QueryRouter {
    /// A router with the rule-based path only.
    pub fn new() -> Self {
        Self { delegate: None }
    }

    /// A router that consults `delegate` for general queries, falling back
    /// to the rule-based path when it fails.
    pub fn with_delegate(delegate: Box<dyn QueryDelegate>) -> Self {
        Self {
            delegate: Some(delegate),
        }
    }

    /// Process one raw query for one user over the loaded record set.
    ///
    /// Never returns an error: denials, not-found lookups and unparseable
    /// requests are all `success = false` results with explanatory text.
    pub fn process(&self, user: &User, records: &[PatientRecord], raw: &str) -> QueryResult {
        let classified = classify(raw);
        match classified.intent {
            Intent::Help => self.help(user, records),
            Intent::IndividualSummary | Intent::LookupById => {
                self.individual(user, records, &classified)
            }
            Intent::PopulationStats => self.population(user, records, raw, &classified),
            Intent::CriteriaSearch | Intent::MedicationQuery | Intent::ConditionQuery => {
                self.criteria(user, records, &classified)
            }
            Intent::General => self.general(user, records, raw),
        }
    }

    /// Usage help with sample ids from the loaded data set. Available to
    /// every role; ids alone are not identifying information.
    fn help(&self, user: &User, records: &[PatientRecord]) -> QueryResult {
        let mut tips = vec!["Reference patients by id, a letter followed by digits.".to_string()];
        let sample_ids: Vec<&str> = records.iter().take(5).map(|r| r.id.as_str()).collect();
        if !sample_ids.is_empty() {
            tips.push(format!("Here are a few ids you can use: {}", sample_ids.join(", ")));
        }
        tips.push("Examples:".to_string());
        tips.push("- Summarize patient ID P001".to_string());
        tips.push("- What is the medication history of patient ID P001?".to_string());
        tips.push("- Find patients aged 60+ with Type 2 Diabetes".to_string());

        QueryResult::answered(user.role, tips.join("\n"))
            .with_redacted_fields(profile_redacted_fields(profile_for(user.role)))
    }

    /// Individual summaries and id lookups.
    fn individual(
        &self,
        user: &User,
        records: &[PatientRecord],
        classified: &ClassifiedQuery,
    ) -> QueryResult {
        if !can_access(user.role, AccessMode::Individual) {
            return QueryResult::refused(user.role, denied_message(user.role))
                .with_redacted_fields(profile_redacted_fields(profile_for(user.role)));
        }

        if classified.patient_id.is_none() && classified.patient_name.is_none() {
            return QueryResult::refused(
                user.role,
                "Please specify a patient name or id, for example 'patient ID P001'.",
            );
        }

        match resolve_patient(records, classified) {
            Some(record) => summarize_patient(user, record, None),
            None => QueryResult::refused(
                user.role,
                "Patient not found. Please specify a valid patient name or id.",
            ),
        }
    }

    /// Population statistics, with a cohort-percentage answer when the
    /// query names a condition or medication and asks for a share.
    fn population(
        &self,
        user: &User,
        records: &[PatientRecord],
        raw: &str,
        classified: &ClassifiedQuery,
    ) -> QueryResult {
        let lower = raw.to_lowercase();
        let wants_share = lower.contains("percentage") || lower.contains("how many");

        if wants_share {
            if let Some(medication) = classified.medications.first() {
                let criteria = SearchCriteria {
                    min_age: classified.min_age,
                    max_age: classified.max_age,
                    medications: vec![medication.clone()],
                    ..SearchCriteria::default()
                };
                let subject = format!("are on {}", title_case(medication));
                return cohort_stats(user, records, &criteria, &subject);
            }
            if let Some(condition) = classified.conditions.first() {
                let criteria = SearchCriteria {
                    min_age: classified.min_age,
                    max_age: classified.max_age,
                    conditions: vec![condition.clone()],
                    ..SearchCriteria::default()
                };
                let subject = format!("have {}", title_case(condition));
                return cohort_stats(user, records, &criteria, &subject);
            }
        }

        population_stats(user, records)
    }

    /// Criteria search and medication/condition questions.
    fn criteria(
        &self,
        user: &User,
        records: &[PatientRecord],
        classified: &ClassifiedQuery,
    ) -> QueryResult {
        // Denial outranks missing-parameter prompts: a role without any
        // data access gets the same denial regardless of query content.
        if !can_access(user.role, AccessMode::Individual)
            && !can_access(user.role, AccessMode::Aggregate)
        {
            return QueryResult::refused(user.role, denied_message(user.role))
                .with_redacted_fields(profile_redacted_fields(profile_for(user.role)));
        }

        if classified.intent == Intent::MedicationQuery && classified.medications.is_empty() {
            return QueryResult::refused(
                user.role,
                "Please name a specific medication, for example Metformin or Lisinopril.",
            );
        }
        if classified.intent == Intent::ConditionQuery && classified.conditions.is_empty() {
            return QueryResult::refused(
                user.role,
                "Please name a specific condition, for example Type 2 Diabetes or Asthma.",
            );
        }

        let criteria = SearchCriteria {
            min_age: classified.min_age,
            max_age: classified.max_age,
            gender: None,
            conditions: classified.conditions.clone(),
            medications: classified.medications.clone(),
        };
        if criteria.is_empty() {
            return QueryResult::refused(
                user.role,
                "Please provide at least one search criterion: an age bound, a condition or a medication.",
            );
        }

        find_by_criteria(user, records, &criteria)
    }

    /// General queries: the delegate when configured, otherwise role-specific
    /// example suggestions. Delegate failure falls back deterministically.
    fn general(&self, user: &User, records: &[PatientRecord], raw: &str) -> QueryResult {
        if let Some(delegate) = &self.delegate {
            let filtered: Vec<_> = records
                .iter()
                .filter_map(|record| filter_record(user, record))
                .collect();
            match delegate.answer(raw, user, &filtered) {
                Ok(result) => return result,
                Err(error) => {
                    tracing::warn!(%error, "delegate failed, using rule-based fallback");
                }
            }
        }

        let examples = example_queries(user.role);
        let mut message =
            "I can help you with medical data queries. Here are some examples of what you can ask:\n"
                .to_string();
        for example in examples {
            message.push_str(&format!("• {example}\n"));
        }

        QueryResult::answered(user.role, message.trim_end().to_string())
            .with_redacted_fields(profile_redacted_fields(profile_for(user.role)))
    }
}

/// Resolve a target record by id, then exact name, then name substring.
fn resolve_patient<'a>(
    records: &'a [PatientRecord],
    classified: &ClassifiedQuery,
) -> Option<&'a PatientRecord> {
    if let Some(id) = &classified.patient_id {
        if let Some(record) = records.iter().find(|r| r.id == *id) {
            return Some(record);
        }
    }
    let name = classified.patient_name.as_deref()?;
    records
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .or_else(|| {
            let lower = name.to_lowercase();
            records.iter().find(|r| r.name.to_lowercase().contains(&lower))
        })
}

/// Role-appropriate example queries for the general fallback answer.
fn example_queries(role: Role) -> &'static [&'static str] {
    match role {
        Role::Doctor => &[
            "Summarize Jane Smith's health history",
            "What is the medication history of patient ID P001?",
            "Find patients with Type 2 Diabetes",
            "Show me all patients taking Metformin",
        ],
        Role::Researcher => &[
            "Find all patients aged 60+ with Type 2 Diabetes",
            "What's the average age of patients?",
            "How many patients have Asthma?",
            "Show statistics about the population",
        ],
        Role::Marketing => &[
            "What percentage of patients are on Metformin?",
            "How many patients have Hypertension?",
            "Show statistics about the population",
        ],
        Role::Intern => &[
            "What can I do with this system?",
            "How does access control work?",
            "How do I reference a patient id?",
        ],
    }
}

/// Capitalise the first letter of each word, for echoing vocabulary terms in
/// answers.
fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
