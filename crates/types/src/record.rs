//! Patient records and their redacted projections.
//!
//! Responsibilities:
//! - Define the read-only [`PatientRecord`] loaded at startup
//! - Define [`FilteredRecord`], the per-role projection where an absent field
//!   means "redacted" (never an empty-string sentinel, which would be
//!   ambiguous with legitimately empty data)
//! - Validate patient identifiers at the boundary via [`PatientId`]

use crate::IdError;
use serde::{Deserialize, Serialize};

/// Prefix applied to patient ids in de-identified projections.
pub const ANONYMOUS_ID_PREFIX: &str = "ANON_";

// ============================================================================
// Field names
// ============================================================================

/// The closed set of fields a patient record carries.
///
/// Redaction reporting and permission allow-lists are expressed in terms of
/// this enum rather than free strings, so a typo in a field name is a compile
/// error rather than a silent permission hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Age,
    Gender,
    Conditions,
    Medications,
    Notes,
    Address,
    VisitDates,
}

impl Field {
    /// Every field, in record order.
    pub const ALL: [Field; 9] = [
        Field::Id,
        Field::Name,
        Field::Age,
        Field::Gender,
        Field::Conditions,
        Field::Medications,
        Field::Notes,
        Field::Address,
        Field::VisitDates,
    ];

    /// Convert to the wire/report name.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Conditions => "conditions",
            Field::Medications => "medications",
            Field::Notes => "notes",
            Field::Address => "address",
            Field::VisitDates => "visit_dates",
        }
    }

    /// Parse from the wire/report name.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Field::Id),
            "name" => Some(Field::Name),
            "age" => Some(Field::Age),
            "gender" => Some(Field::Gender),
            "conditions" => Some(Field::Conditions),
            "medications" => Some(Field::Medications),
            "notes" => Some(Field::Notes),
            "address" => Some(Field::Address),
            "visit_dates" => Some(Field::VisitDates),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Field::from_wire(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown field name '{s}'")))
    }
}

// ============================================================================
// Patient identifier
// ============================================================================

/// A validated patient identifier: one ASCII letter followed by digits.
///
/// The input is trimmed and upper-cased during construction, so `p001` and
/// `P001` compare equal. Construction fails for any other shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    /// Parse and normalise a patient id.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for blank input and [`IdError::Malformed`]
    /// when the trimmed input is not a letter followed by one or more digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }

        let mut chars = trimmed.chars();
        let leading_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest: Vec<char> = chars.collect();
        let digit_tail = !rest.is_empty() && rest.iter().all(|c| c.is_ascii_digit());

        if !leading_letter || !digit_tail {
            return Err(IdError::Malformed(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the normalised id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A full patient record, loaded once at startup and treated as read-only.
///
/// `age` is optional: records with an unknown age exist in real data sets and
/// must be excluded from mean-age calculations rather than counted as zero.
/// Visit dates are ISO `YYYY-MM-DD` strings, which order lexicographically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: String,
    #[serde(default)]
    pub age: Option<u16>,
    pub gender: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub visit_dates: Vec<String>,
}

/// The per-role projection of a [`PatientRecord`].
///
/// Every field except `id` is optional; an absent field was redacted for the
/// requesting role. `id` is either the original id or the original id behind
/// the [`ANONYMOUS_ID_PREFIX`] when identifying information is withheld.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_dates: Option<Vec<String>>,
}
