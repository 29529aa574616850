//! # MedQuery Core
//!
//! Core business logic for the MedQuery role-based patient query system.
//!
//! This crate contains pure query processing over an immutable record set:
//! - Per-role permission profiles and field-level redaction
//! - Deterministic free-text classification into query intents
//! - Individual summaries and population aggregates under capability checks
//! - A query router that dispatches classified queries and assembles results
//!
//! **No API concerns**: terminal sessions and CLI surfaces belong in
//! `medquery-run` and `medquery-cli`. The core is synchronous and holds no
//! mutable shared state; each call reads the supplied records and returns a
//! freshly constructed result.

pub mod access;
pub mod classify;
pub mod delegate;
pub mod permissions;
pub mod router;
pub mod stats;
pub mod store;
pub mod summary;
pub mod vocab;

pub use access::{
    can_access, denied_message, filter_record, profile_redacted_fields, redacted_fields,
    visible_fields, AccessMode,
};
pub use classify::{classify, ClassifiedQuery, Intent};
pub use delegate::{DelegateError, QueryDelegate};
pub use permissions::{profile_for, PermissionProfile};
pub use router::QueryRouter;
pub use stats::{cohort_stats, find_by_criteria, population_stats, SearchCriteria};
pub use store::{load_records, StoreError};
pub use summary::summarize_patient;
