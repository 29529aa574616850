//! Deterministic free-text query classification.
//!
//! Responsibilities:
//! - Map raw text to one [`Intent`] via an ordered rule list where the first
//!   matching rule wins; the order is load-bearing because several rules can
//!   match the same text
//! - Extract structured parameters (id, name, age bounds, condition and
//!   medication keywords) opportunistically, independent of the intent
//!
//! No external calls, no learning: identical input always yields an
//! identical [`ClassifiedQuery`].

use crate::vocab;
use medquery_types::PatientId;
use once_cell::sync::Lazy;
use regex::Regex;

/// The classified purpose of a free-text query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Render one patient's history as a summary.
    IndividualSummary,
    /// Look a patient up by id.
    LookupById,
    /// Population-level counts, averages or percentages.
    PopulationStats,
    /// Search for patients matching conjunctive criteria.
    CriteriaSearch,
    /// Question about a medication.
    MedicationQuery,
    /// Question about a condition.
    ConditionQuery,
    /// Usage question about ids or how to phrase queries.
    Help,
    /// Anything else; answered with role-specific examples or a delegate.
    General,
}

/// A query after classification: intent plus every parameter the text
/// yielded. Derived transiently from raw text and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedQuery {
    pub intent: Intent,
    pub patient_id: Option<PatientId>,
    pub patient_name: Option<String>,
    pub min_age: Option<u16>,
    pub max_age: Option<u16>,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
}

static HELP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"examples?\b.*\bids?\b",
        r"\bids?\b.*\bformat\b",
        r"valid\b.*\bids?\b",
        r"how\b.*\breference\b.*\bpatient\b",
        r"how\b.*\buse\b.*\bids?\b",
        r"how\b.*\bfind\b.*\bpatient\b.*\bids?\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("help pattern is valid"))
    .collect()
});

static ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:patient\s+id\s+|id\s+)?([a-z]\d+)\b").expect("id pattern is valid")
});

static DOUBLE_QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quote pattern is valid"));
static SINGLE_QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'([^']{2,})'").expect("quote pattern is valid"));

static CAPITALISED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[Pp]atient|[Ss]ummarize)\s+([A-Z][a-z]+)\s+([A-Z][a-z]+)")
        .expect("name pattern is valid")
});

static BETWEEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bbetween\s+(\d{1,3})\s+and\s+(\d{1,3})\b").expect("age pattern is valid")
});
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\s*-\s*(\d{1,3})\b").expect("age pattern is valid"));
static MIN_PLUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})\s*\+").expect("age pattern is valid"));
static OVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bover\s+(\d{1,3})\b").expect("age pattern is valid"));
static AGED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\baged\s+(\d{1,3})\b").expect("age pattern is valid"));

/// Classify raw query text.
pub fn classify(text: &str) -> ClassifiedQuery {
    let lower = text.to_lowercase();
    let intent = intent_for(&lower);
    let (min_age, max_age) = extract_age_bounds(&lower);

    let classified = ClassifiedQuery {
        intent,
        patient_id: extract_patient_id(&lower),
        patient_name: extract_patient_name(text),
        min_age,
        max_age,
        conditions: vocab::contained_terms(vocab::KNOWN_CONDITIONS, &lower),
        medications: vocab::contained_terms(vocab::KNOWN_MEDICATIONS, &lower),
    };
    tracing::debug!(intent = ?classified.intent, "classified query");
    classified
}

/// The ordered intent rules. First match wins.
fn intent_for(lower: &str) -> Intent {
    if HELP_PATTERNS.iter().any(|re| re.is_match(lower)) {
        return Intent::Help;
    }
    if lower.contains("summarize") && (lower.contains("patient") || lower.contains("history")) {
        return Intent::IndividualSummary;
    }
    if lower.contains("patient id") || lower.contains("medication history") {
        return Intent::LookupById;
    }
    if lower.contains("percentage")
        || lower.contains("average")
        || lower.contains("how many")
        || lower.contains("statistics")
    {
        return Intent::PopulationStats;
    }
    if lower.contains("find") && lower.contains("patients") {
        return Intent::CriteriaSearch;
    }
    if lower.contains("medication")
        || lower.contains("drug")
        || lower.contains("prescribed")
        || lower.contains("taking")
    {
        return Intent::MedicationQuery;
    }
    if lower.contains("condition")
        || vocab::KNOWN_CONDITIONS.iter().any(|term| lower.contains(term))
    {
        return Intent::ConditionQuery;
    }
    Intent::General
}

/// A single letter followed by digits, optionally preceded by "patient id "
/// or "id ".
fn extract_patient_id(lower: &str) -> Option<PatientId> {
    ID_RE
        .captures(lower)
        .and_then(|caps| PatientId::parse(&caps[1]).ok())
}

/// A quoted substring, or a Two Capitalised Words sequence following
/// "patient " or "summarize ". Capitalisation is checked against the
/// original text, not the lowered copy.
fn extract_patient_name(text: &str) -> Option<String> {
    if let Some(caps) = DOUBLE_QUOTED_RE.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    if let Some(caps) = SINGLE_QUOTED_RE.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    CAPITALISED_NAME_RE
        .captures(text)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
}

/// Age bound extraction in fixed order: the explicit range patterns first,
/// then the single-bound patterns. A later match never overwrites a bound
/// that is already set.
fn extract_age_bounds(lower: &str) -> (Option<u16>, Option<u16>) {
    let mut min_age: Option<u16> = None;
    let mut max_age: Option<u16> = None;

    for re in [&*BETWEEN_RE, &*RANGE_RE] {
        if let Some(caps) = re.captures(lower) {
            if min_age.is_none() {
                min_age = caps[1].parse().ok();
            }
            if max_age.is_none() {
                max_age = caps[2].parse().ok();
            }
        }
    }

    for re in [&*MIN_PLUS_RE, &*OVER_RE, &*AGED_RE] {
        if min_age.is_some() {
            break;
        }
        if let Some(caps) = re.captures(lower) {
            min_age = caps[1].parse().ok();
        }
    }

    (min_age, max_age)
}
