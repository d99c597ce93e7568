//! In-memory patient views.
//!
//! One canonical ordered `Vec` backs iteration, and an ID → position index
//! backs point lookup and de-duplication. Every mutation goes through this
//! type so the two can never drift apart.

use std::collections::HashMap;

use crate::models::{Patient, PatientId};

#[derive(Debug, Default, Clone)]
pub struct PatientCache {
    records: Vec<Patient>,
    index: HashMap<PatientId, usize>,
}

impl PatientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every record with `records`, keeping their order.
    ///
    /// A repeated ID keeps its first position and takes the later value.
    pub fn replace_all(&mut self, records: Vec<Patient>) {
        self.records.clear();
        self.index.clear();
        for patient in records {
            self.upsert(patient);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Append a new record, or replace in place if the ID is already cached.
    pub fn upsert(&mut self, patient: Patient) {
        match self.index.get(&patient.patient_id).copied() {
            Some(pos) => self.records[pos] = patient,
            None => {
                self.index.insert(patient.patient_id, self.records.len());
                self.records.push(patient);
            }
        }
    }

    /// Swap in a new value for a cached ID, keeping its position.
    ///
    /// Returns the previous value, or `None` (and changes nothing) if the ID
    /// is not cached.
    pub fn replace(&mut self, patient: Patient) -> Option<Patient> {
        let pos = *self.index.get(&patient.patient_id)?;
        Some(std::mem::replace(&mut self.records[pos], patient))
    }

    /// Remove by ID, shifting later records down.
    pub fn remove(&mut self, patient_id: PatientId) -> Option<Patient> {
        let pos = self.index.remove(&patient_id)?;
        let removed = self.records.remove(pos);
        for patient in &self.records[pos..] {
            if let Some(slot) = self.index.get_mut(&patient.patient_id) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, patient_id: PatientId) -> Option<&Patient> {
        self.index.get(&patient_id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, patient_id: PatientId) -> bool {
        self.index.contains_key(&patient_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in cache order.
    pub fn iter(&self) -> std::slice::Iter<'_, Patient> {
        self.records.iter()
    }

    /// Owned copy of the ordered records.
    pub fn to_vec(&self) -> Vec<Patient> {
        self.records.clone()
    }

    /// IDs in cache order.
    pub fn ids(&self) -> Vec<PatientId> {
        self.records.iter().map(|p| p.patient_id).collect()
    }

    /// Check that the ordered records and the index describe the same set of IDs
    /// and that every index entry points at its record.
    pub fn is_consistent(&self) -> bool {
        self.records.len() == self.index.len()
            && self.records.iter().enumerate().all(|(pos, patient)| {
                self.index.get(&patient.patient_id) == Some(&pos)
            })
    }
}

impl<'a> IntoIterator for &'a PatientCache {
    type Item = &'a Patient;
    type IntoIter = std::slice::Iter<'a, Patient>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
