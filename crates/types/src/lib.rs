//! # MedQuery Types
//!
//! Shared data model for the MedQuery role-based patient query system.
//!
//! This crate defines the types that cross crate boundaries:
//! - Roles, users and the closed set of record fields
//! - The read-only patient record and its redacted projection
//! - The query result envelope returned for every processed query
//!
//! **No behaviour**: permission tables, filtering and query routing belong in
//! `medquery-core`. This crate carries only data and validation.

pub mod query;
pub mod record;
pub mod role;

pub use query::{
    CohortCount, FrequencyEntry, PatientSummary, PopulationStats, QueryData, QueryResult,
};
pub use record::{Field, FilteredRecord, PatientId, PatientRecord, ANONYMOUS_ID_PREFIX};
pub use role::{Role, User};

/// Errors that can occur when constructing validated identifier types.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was empty or contained only whitespace.
    #[error("patient id cannot be empty")]
    Empty,
    /// The input did not match the expected letter-then-digits shape.
    #[error("patient id must be a letter followed by digits, got '{0}'")]
    Malformed(String),
}
