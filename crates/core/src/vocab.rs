//! Fixed keyword vocabulary for query parameter extraction.
//!
//! Matching is case-insensitive substring containment, not tokenisation, so
//! multi-word synonyms are recognised only when present verbatim. More
//! specific terms come first so the first extracted keyword is the most
//! specific one.

/// Condition names recognised in free text, lowercase, most specific first.
pub const KNOWN_CONDITIONS: &[&str] = &[
    "type 2 diabetes",
    "diabetes",
    "hypertension",
    "asthma",
    "high cholesterol",
    "cholesterol",
    "arthritis",
    "anxiety",
];

/// Medication names recognised in free text, lowercase.
pub const KNOWN_MEDICATIONS: &[&str] = &[
    "metformin",
    "lisinopril",
    "albuterol",
    "atorvastatin",
    "ibuprofen",
    "sertraline",
];

/// Collect every vocabulary entry contained in `lowercase_text`.
///
/// The caller must pass already-lowercased text; entries are returned in
/// vocabulary order, which keeps extraction deterministic.
pub fn contained_terms(vocabulary: &[&str], lowercase_text: &str) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|term| lowercase_text.contains(*term))
        .map(|term| (*term).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_multi_word_terms() {
        let terms = contained_terms(KNOWN_CONDITIONS, "patients with type 2 diabetes");
        assert_eq!(terms, vec!["type 2 diabetes", "diabetes"]);
    }

    #[test]
    fn specific_term_comes_first() {
        let terms = contained_terms(KNOWN_CONDITIONS, "high cholesterol check");
        assert_eq!(terms.first().map(String::as_str), Some("high cholesterol"));
    }

    #[test]
    fn no_match_yields_empty() {
        assert!(contained_terms(KNOWN_MEDICATIONS, "average age of patients").is_empty());
    }
}
