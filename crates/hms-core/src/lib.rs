//! HMS Core Library
//!
//! Patient persistence and in-memory consistency layer for the hospital
//! records desktop application.
//!
//! # Architecture
//!
//! ```text
//!   Desktop shell (dashboard, patient forms)
//!                    │
//!              HmsCore (FFI, Mutex)
//!                    │
//!             PatientService ──── Validation
//!            ┌───────┴────────┐
//!       PatientCache    PatientRepository
//!   (ordered + index)          │
//!                       Database (SQLite)
//! ```
//!
//! Reads are served from [`service::PatientCache`]. Writes are validated,
//! persisted, and only then applied to the cache.
//!
//! # Modules
//!
//! - [`db`]: SQLite connection provider, schema and patient repository
//! - [`models`]: Domain types (Patient, Gender, PatientStatistics)
//! - [`service`]: Write-through patient cache
//! - [`validation`]: Pre-write payload checks
//! - [`clock`]: Injectable time source
//! - [`config`]: Startup configuration

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::CoreConfig;
pub use db::{ConnectionProvider, Database, DbLocation, PatientRepository, StorageError};
pub use error::{PatientError, PatientResult};
pub use models::{AgeGroupCounts, Gender, Patient, PatientId, PatientStatistics};
pub use service::{PatientCache, PatientService};
pub use validation::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HmsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<PatientError> for HmsError {
    fn from(e: PatientError) -> Self {
        match e {
            PatientError::Validation(v) => HmsError::Validation(v.to_string()),
            PatientError::Storage(s) => HmsError::DatabaseError(s.to_string()),
        }
    }
}

impl From<StorageError> for HmsError {
    fn from(e: StorageError) -> Self {
        HmsError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for HmsError {
    fn from(e: serde_json::Error) -> Self {
        HmsError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HmsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HmsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber. Later calls are ignored.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let filter = filter.unwrap_or_else(|| config::DEFAULT_LOG_FILTER.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HmsCore>, HmsError> {
    HmsCore::open(DbLocation::File(path.into()), clock::system_clock())
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HmsCore>, HmsError> {
    HmsCore::open(DbLocation::Memory, clock::system_clock())
}

/// Open the database named by `HMS_DATABASE_PATH` and install logging from `HMS_LOG`.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<HmsCore>, HmsError> {
    let config = CoreConfig::from_env();
    init_logging(Some(config.log_filter().to_string()));
    HmsCore::open(config.database().clone(), clock::system_clock())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe patient service wrapper for FFI.
///
/// The lock is held across each repository call and the cache update that
/// follows it.
#[derive(uniffi::Object)]
pub struct HmsCore {
    service: Mutex<PatientService<Database>>,
    clock: SharedClock,
}

impl HmsCore {
    /// Open the store at `location` and load the patient cache.
    pub fn open(location: DbLocation, clock: SharedClock) -> Result<Arc<Self>, HmsError> {
        let db = Database::open_at(location, clock.clone())?;
        Ok(Arc::new(Self {
            service: Mutex::new(PatientService::new(db, clock.clone())),
            clock,
        }))
    }

    fn to_ffi(&self, patient: Patient) -> FfiPatient {
        let age = patient.age_on(self.clock.today());
        FfiPatient::from_patient(patient, age)
    }

    fn to_ffi_all(&self, patients: Vec<Patient>) -> Vec<FfiPatient> {
        patients.into_iter().map(|p| self.to_ffi(p)).collect()
    }
}

#[uniffi::export]
impl HmsCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All cached patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, HmsError> {
        let patients = self.service.lock()?.get_all();
        Ok(self.to_ffi_all(patients))
    }

    /// Get a cached patient by ID.
    pub fn get_patient(&self, patient_id: i64) -> Result<Option<FfiPatient>, HmsError> {
        let patient = self.service.lock()?.get(patient_id);
        Ok(patient.map(|p| self.to_ffi(p)))
    }

    /// Register a new patient. Returns the assigned ID.
    pub fn add_patient(&self, patient: FfiPatient) -> Result<i64, HmsError> {
        let patient = Patient::try_from(patient)?;
        Ok(self.service.lock()?.add(patient)?)
    }

    /// Update an existing patient. `false` when no such patient is stored.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, HmsError> {
        let patient = Patient::try_from(patient)?;
        Ok(self.service.lock()?.update(patient)?)
    }

    /// Delete a patient. `false` when no such patient is stored.
    pub fn delete_patient(&self, patient_id: i64) -> Result<bool, HmsError> {
        Ok(self.service.lock()?.delete(patient_id)?)
    }

    /// Reload the cache from the database. Returns the number of patients loaded.
    ///
    /// A store failure empties the cache and returns 0; the message is
    /// available from [`last_load_error`](Self::last_load_error).
    pub fn refresh_patients(&self) -> Result<u32, HmsError> {
        Ok(self.service.lock()?.refresh() as u32)
    }

    /// Message of the most recent failed load, `None` after a successful one.
    pub fn last_load_error(&self) -> Result<Option<String>, HmsError> {
        Ok(self.service.lock()?.last_load_error().map(str::to_string))
    }

    /// Search patients by name.
    pub fn search_patients(&self, term: String) -> Result<Vec<FfiPatient>, HmsError> {
        let patients = self.service.lock()?.search(&term);
        Ok(self.to_ffi_all(patients))
    }

    /// Patients aged `min_age` through `max_age`.
    pub fn filter_patients_by_age(
        &self,
        min_age: u32,
        max_age: u32,
    ) -> Result<Vec<FfiPatient>, HmsError> {
        let patients = self.service.lock()?.filter_by_age_range(min_age, max_age);
        Ok(self.to_ffi_all(patients))
    }

    /// Patients with a given blood type.
    pub fn patients_by_blood_type(&self, blood_type: String) -> Result<Vec<FfiPatient>, HmsError> {
        let patients = self.service.lock()?.by_blood_type(&blood_type);
        Ok(self.to_ffi_all(patients))
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Aggregate patient statistics.
    pub fn patient_statistics(&self) -> Result<FfiPatientStatistics, HmsError> {
        Ok(self.service.lock()?.statistics().into())
    }

    /// Aggregate patient statistics as JSON.
    pub fn patient_statistics_json(&self) -> Result<String, HmsError> {
        Ok(self.service.lock()?.statistics().to_json()?)
    }

    /// Release the database connection; the next operation reopens it.
    pub fn close(&self) -> Result<(), HmsError> {
        self.service.lock()?.repository_mut().close();
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiGender {
    Male,
    Female,
    Other,
}

impl From<Gender> for FfiGender {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => FfiGender::Male,
            Gender::Female => FfiGender::Female,
            Gender::Other => FfiGender::Other,
        }
    }
}

impl From<FfiGender> for Gender {
    fn from(gender: FfiGender) -> Self {
        match gender {
            FfiGender::Male => Gender::Male,
            FfiGender::Female => Gender::Female,
            FfiGender::Other => Gender::Other,
        }
    }
}

/// FFI-safe patient. Dates travel as `YYYY-MM-DD`, timestamps as `YYYY-MM-DD HH:MM:SS[.fraction]`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<FfiGender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub blood_type: Option<String>,
    pub registration_date: Option<String>,
    pub created_by: Option<i64>,
    /// Derived, ignored on input
    pub age: u32,
}

impl FfiPatient {
    fn from_patient(patient: Patient, age: u32) -> Self {
        Self {
            patient_id: patient.patient_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth: patient
                .date_of_birth
                .map(|d| d.format(DATE_FORMAT).to_string()),
            gender: patient.gender.map(Into::into),
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            emergency_contact: patient.emergency_contact,
            emergency_phone: patient.emergency_phone,
            blood_type: patient.blood_type,
            registration_date: patient
                .registration_date
                .map(|d| d.format(DATE_TIME_FORMAT).to_string()),
            created_by: patient.created_by,
            age,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = HmsError;

    fn try_from(patient: FfiPatient) -> Result<Self, Self::Error> {
        let date_of_birth = patient
            .date_of_birth
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map_err(|e| HmsError::InvalidInput(format!("date of birth '{}': {}", s, e)))
            })
            .transpose()?;
        let registration_date = patient
            .registration_date
            .as_deref()
            .map(|s| {
                NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT).map_err(|e| {
                    HmsError::InvalidInput(format!("registration date '{}': {}", s, e))
                })
            })
            .transpose()?;

        Ok(Patient {
            patient_id: patient.patient_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth,
            gender: patient.gender.map(Into::into),
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            emergency_contact: patient.emergency_contact,
            emergency_phone: patient.emergency_phone,
            blood_type: patient.blood_type,
            registration_date,
            created_by: patient.created_by,
        })
    }
}

/// FFI-safe patient statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientStatistics {
    pub total_patients: u32,
    pub average_age: f64,
    pub children: u32,
    pub adults: u32,
    pub seniors: u32,
    /// Keyed by `MALE`, `FEMALE`, `OTHER`
    pub gender_distribution: HashMap<String, u32>,
}

impl From<PatientStatistics> for FfiPatientStatistics {
    fn from(stats: PatientStatistics) -> Self {
        Self {
            total_patients: stats.total_patients as u32,
            average_age: stats.average_age,
            children: stats.age_groups.children as u32,
            adults: stats.age_groups.adults as u32,
            seniors: stats.age_groups.seniors as u32,
            gender_distribution: stats
                .gender_distribution
                .into_iter()
                .map(|(gender, count)| (gender.as_str().to_string(), count as u32))
                .collect(),
        }
    }
}
