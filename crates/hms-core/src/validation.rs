//! Structural checks run before any patient write reaches the store.
//!
//! Checks fail fast: the first violated rule is reported and nothing else.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Patient;

/// A caller-correctable problem with a patient payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("First name is required.")]
    MissingFirstName,

    #[error("Last name is required.")]
    MissingLastName,

    #[error("Date of birth is required.")]
    MissingDateOfBirth,

    #[error("Date of birth cannot be in the future.")]
    FutureDateOfBirth,

    #[error("Gender is required.")]
    MissingGender,

    #[error("Patient ID is required for update operation.")]
    MissingPatientId,
}

pub type ValidationResult = Result<(), ValidationError>;

/// Validate the fields required to persist a patient.
pub fn validate_patient(patient: &Patient, today: NaiveDate) -> ValidationResult {
    if patient.first_name.trim().is_empty() {
        return Err(ValidationError::MissingFirstName);
    }
    if patient.last_name.trim().is_empty() {
        return Err(ValidationError::MissingLastName);
    }
    let dob = patient
        .date_of_birth
        .ok_or(ValidationError::MissingDateOfBirth)?;
    if dob > today {
        return Err(ValidationError::FutureDateOfBirth);
    }
    if patient.gender.is_none() {
        return Err(ValidationError::MissingGender);
    }
    Ok(())
}

/// Validate a patient for update: it must already have an ID.
pub fn validate_for_update(patient: &Patient, today: NaiveDate) -> ValidationResult {
    require_id(patient)?;
    validate_patient(patient, today)
}

pub(crate) fn require_id(patient: &Patient) -> ValidationResult {
    if patient.is_new() {
        return Err(ValidationError::MissingPatientId);
    }
    Ok(())
}

/// Trim and uppercase a blood type; blank becomes `None`.
pub fn normalize_blood_type(blood_type: Option<String>) -> Option<String> {
    blood_type
        .map(|bt| bt.trim().to_uppercase())
        .filter(|bt| !bt.is_empty())
}
