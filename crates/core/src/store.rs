//! Patient record loading.
//!
//! Records are loaded once at startup from a JSON array file and treated as
//! read-only from then on. Structural validation (id shape, field types)
//! happens during deserialisation; visit dates are additionally checked
//! here because the rest of the core relies on their ISO ordering.

use chrono::NaiveDate;
use medquery_types::PatientRecord;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read patient data file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialise patient data: {0}")]
    Deserialization(serde_json::Error),
    #[error("invalid visit date '{date}' on patient {id} (expected YYYY-MM-DD)")]
    InvalidVisitDate { id: String, date: String },
}

/// Load the patient record set from a JSON array file.
pub fn load_records(path: &Path) -> Result<Vec<PatientRecord>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(StoreError::FileRead)?;
    let records: Vec<PatientRecord> =
        serde_json::from_str(&contents).map_err(StoreError::Deserialization)?;

    for record in &records {
        for date in &record.visit_dates {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(StoreError::InvalidVisitDate {
                    id: record.id.to_string(),
                    date: date.clone(),
                });
            }
        }
    }

    tracing::info!(count = records.len(), path = %path.display(), "loaded patient records");
    Ok(records)
}
