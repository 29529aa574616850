//! Query result envelope and payload types.
//!
//! Every processed query produces exactly one [`QueryResult`]. Denials,
//! not-found lookups and unparseable requests are all represented as
//! `success = false` results with explanatory text — never as errors, so no
//! query can be fatal to the caller.

use crate::record::{Field, FilteredRecord};
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// The result of processing one query for one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Whether the query was answered. Denials and prompts are `false`.
    pub success: bool,
    /// Human-readable answer, denial reason or prompt.
    pub message: String,
    /// The role the result was computed for.
    pub access_level: Role,
    /// Structured payload; shape depends on the query intent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
    /// Fields withheld from the requesting role, for audit reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_fields: Option<Vec<Field>>,
}

impl QueryResult {
    /// An answered result with no structured payload.
    pub fn answered(role: Role, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            access_level: role,
            data: None,
            redacted_fields: None,
        }
    }

    /// A refused result (denial, not-found or missing-parameter prompt).
    pub fn refused(role: Role, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            access_level: role,
            data: None,
            redacted_fields: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: QueryData) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the audit list of redacted fields.
    pub fn with_redacted_fields(mut self, fields: Vec<Field>) -> Self {
        self.redacted_fields = Some(fields);
        self
    }
}

/// Structured payload attached to a [`QueryResult`].
///
/// Payload shape per intent:
/// - individual summaries and id lookups carry [`QueryData::Summary`]
/// - population statistics carry [`QueryData::Stats`]
/// - criteria searches carry [`QueryData::Records`] when the caller may see
///   per-record detail, or [`QueryData::Matches`] when only counts may be
///   disclosed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryData {
    Summary(PatientSummary),
    Stats(PopulationStats),
    Records(Vec<FilteredRecord>),
    Matches(CohortCount),
}

/// A rendered individual patient summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    /// Multi-line rendered text, already redacted for the requesting role.
    pub text: String,
    /// Whether the text was shortened to a caller-supplied maximum length.
    pub truncated: bool,
}

/// Population-level statistics over the full record set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub total_patients: usize,
    /// Mean age over records with a known age; `None` when no ages are known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_age: Option<f64>,
    /// Count per distinct gender string, case-sensitive as stored.
    pub gender_distribution: Vec<(String, usize)>,
    /// Up to ten most frequent conditions, descending, first-seen tie-break.
    pub top_conditions: Vec<FrequencyEntry>,
    /// Up to ten most frequent medications, descending, first-seen tie-break.
    pub top_medications: Vec<FrequencyEntry>,
}

/// One row of a frequency table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub name: String,
    /// Number of distinct patients carrying this entry.
    pub count: usize,
    /// Share of the total population, rounded to two decimal places.
    pub percentage: f64,
}

/// Count-only answer for cohort questions from aggregate-only roles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CohortCount {
    pub matched: usize,
    pub total: usize,
    /// `matched / total` as a percentage, rounded to two decimal places.
    pub percentage: f64,
}
