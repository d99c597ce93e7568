//! Error kinds surfaced by the repository and the patient service.

use thiserror::Error;

use crate::db::StorageError;
use crate::validation::ValidationError;

/// Either a caller-correctable payload problem or a store failure.
#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PatientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PatientError::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, PatientError::Storage(_))
    }
}

impl From<rusqlite::Error> for PatientError {
    fn from(e: rusqlite::Error) -> Self {
        PatientError::Storage(e.into())
    }
}

pub type PatientResult<T> = Result<T, PatientError>;
