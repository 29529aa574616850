//! Optional AI delegate seam.
//!
//! The router may hold a delegate that answers general queries with free
//! text. The core treats it as opaque: its result type is the same
//! [`QueryResult`] the rule-based path produces, and any failure makes the
//! router fall back to the rule-based answer. The delegate only ever
//! receives records that already passed access-control filtering for the
//! requesting role — never the raw record set.

use medquery_types::{FilteredRecord, QueryResult, User};

/// Errors an external delegate can surface.
///
/// These never propagate to the caller of the router; they only trigger the
/// deterministic rule-based fallback.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    #[error("delegate unavailable: {0}")]
    Unavailable(String),
    #[error("delegate failed to answer: {0}")]
    Failed(String),
}

/// An external natural-language answerer, held by the router by capability.
pub trait QueryDelegate: Send + Sync {
    /// Answer `query` for `user` over the pre-filtered record views.
    fn answer(
        &self,
        query: &str,
        user: &User,
        filtered: &[FilteredRecord],
    ) -> Result<QueryResult, DelegateError>;
}
