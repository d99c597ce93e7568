//! Patient service: write-through cache over a [`PatientRepository`].
//!
//! Reads are answered from memory. Writes are validated, persisted, and only
//! then applied to the cache, so a failed write never changes what readers see.

mod cache;

pub use cache::*;

use tracing::{debug, error, info};

use crate::clock::SharedClock;
use crate::db::PatientRepository;
use crate::error::PatientResult;
use crate::models::{Patient, PatientId, PatientStatistics};
use crate::validation::{normalize_blood_type, validate_for_update, validate_patient};

/// Keeps the cached patient list in step with the store.
#[derive(Debug)]
pub struct PatientService<R> {
    repository: R,
    clock: SharedClock,
    cache: PatientCache,
    last_load_error: Option<String>,
}

impl<R: PatientRepository> PatientService<R> {
    /// Create the service and populate the cache from the repository.
    pub fn new(repository: R, clock: SharedClock) -> Self {
        let mut service = Self {
            repository,
            clock,
            cache: PatientCache::new(),
            last_load_error: None,
        };
        service.load();
        service
    }

    /// Reload every patient from the repository.
    ///
    /// On failure the cache is left empty and the error is logged and kept in
    /// [`last_load_error`](Self::last_load_error). Returns the number loaded.
    pub fn load(&mut self) -> usize {
        match self.repository.get_all() {
            Ok(patients) => {
                self.cache.replace_all(patients);
                self.last_load_error = None;
                info!(count = self.cache.len(), "patients loaded");
            }
            Err(e) => {
                error!(error = %e, "error loading patients");
                self.cache.clear();
                self.last_load_error = Some(e.to_string());
            }
        }
        self.cache.len()
    }

    /// Alias for [`load`](Self::load) used by the dashboard's refresh action.
    pub fn refresh(&mut self) -> usize {
        self.load()
    }

    /// Message of the most recent failed load, cleared by a successful one.
    pub fn last_load_error(&self) -> Option<&str> {
        self.last_load_error.as_deref()
    }

    /// Copy of all cached patients in cache order.
    pub fn get_all(&self) -> Vec<Patient> {
        self.cache.to_vec()
    }

    /// Cached patient by ID.
    pub fn get(&self, patient_id: PatientId) -> Option<Patient> {
        self.cache.get(patient_id).cloned()
    }

    /// Validate, persist and cache a new patient. Returns the assigned ID.
    pub fn add(&mut self, mut patient: Patient) -> PatientResult<PatientId> {
        patient.blood_type = normalize_blood_type(patient.blood_type.take());
        validate_patient(&patient, self.clock.today())?;
        patient
            .registration_date
            .get_or_insert_with(|| self.clock.now());

        let patient_id = self.repository.insert(&patient)?;
        patient.patient_id = patient_id;
        self.cache.upsert(patient);

        debug!(patient_id, "patient added");
        Ok(patient_id)
    }

    /// Validate and persist changes to an existing patient.
    ///
    /// `Ok(false)` means the store had no such row; the cache is untouched.
    /// Registration date and creator are never taken from `patient`: they come
    /// from the cached record, or from the stored row if it is not cached.
    pub fn update(&mut self, mut patient: Patient) -> PatientResult<bool> {
        patient.blood_type = normalize_blood_type(patient.blood_type.take());
        validate_for_update(&patient, self.clock.today())?;

        let patient_id = patient.patient_id;
        if !self.repository.update(&patient)? {
            debug!(patient_id, "update matched no patient");
            return Ok(false);
        }

        match self.cache.get(patient_id) {
            Some(cached) => {
                patient.registration_date = cached.registration_date;
                patient.created_by = cached.created_by;
                self.cache.replace(patient);
            }
            None => {
                if let Some(stored) = self.repository.get_by_id(patient_id)? {
                    self.cache.upsert(stored);
                }
            }
        }
        debug!(patient_id, "patient updated");
        Ok(true)
    }

    /// Delete a patient from the store and the cache.
    ///
    /// `Ok(false)` means the store had no such row; the cache is untouched.
    pub fn delete(&mut self, patient_id: PatientId) -> PatientResult<bool> {
        if !self.repository.delete(patient_id)? {
            debug!(patient_id, "delete matched no patient");
            return Ok(false);
        }

        self.cache.remove(patient_id);
        debug!(patient_id, "patient deleted");
        Ok(true)
    }

    /// Case-insensitive substring search over first, last and full name.
    ///
    /// An empty term matches every patient.
    pub fn search(&self, term: &str) -> Vec<Patient> {
        let needle = term.to_lowercase();
        self.cache
            .iter()
            .filter(|p| p.name_contains(&needle))
            .cloned()
            .collect()
    }

    /// Patients whose current age lies in `min_age..=max_age`.
    pub fn filter_by_age_range(&self, min_age: u32, max_age: u32) -> Vec<Patient> {
        let today = self.clock.today();
        self.cache
            .iter()
            .filter(|p| (min_age..=max_age).contains(&p.age_on(today)))
            .cloned()
            .collect()
    }

    /// Patients with the given blood type, compared case-insensitively.
    pub fn by_blood_type(&self, blood_type: &str) -> Vec<Patient> {
        let wanted = blood_type.trim();
        self.cache
            .iter()
            .filter(|p| {
                p.blood_type
                    .as_deref()
                    .is_some_and(|bt| bt.eq_ignore_ascii_case(wanted))
            })
            .cloned()
            .collect()
    }

    /// Aggregate counts and ages over the cached patients.
    pub fn statistics(&self) -> PatientStatistics {
        PatientStatistics::compute(&self.cache, self.clock.today())
    }

    /// Age of `patient` as of the service clock.
    pub fn age_of(&self, patient: &Patient) -> u32 {
        patient.age_on(self.clock.today())
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Read-only view of the cache.
    pub fn cache(&self) -> &PatientCache {
        &self.cache
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Direct repository access, e.g. to close the connection.
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }
}
