//! Aggregate patient statistics.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patient::{Gender, Patient};

/// Patient counts per fixed age band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupCounts {
    /// Ages 0-17
    pub children: usize,
    /// Ages 18-64
    pub adults: usize,
    /// Ages 65 and over
    pub seniors: usize,
}

impl AgeGroupCounts {
    fn record(&mut self, age: u32) {
        match age {
            0..=17 => self.children += 1,
            18..=64 => self.adults += 1,
            _ => self.seniors += 1,
        }
    }
}

/// Snapshot of the cached patient population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientStatistics {
    pub total_patients: usize,
    /// Mean age in years, 0.0 when there are no patients
    pub average_age: f64,
    pub age_groups: AgeGroupCounts,
    /// Patients without a recorded gender are not counted here
    pub gender_distribution: BTreeMap<Gender, usize>,
}

impl PatientStatistics {
    /// Compute statistics over `patients` with ages taken on `today`.
    pub fn compute<'a, I>(patients: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Patient>,
    {
        let mut stats = Self::default();
        let mut age_sum: u64 = 0;

        for patient in patients {
            let age = patient.age_on(today);
            stats.total_patients += 1;
            age_sum += u64::from(age);
            stats.age_groups.record(age);
            if let Some(gender) = patient.gender {
                *stats.gender_distribution.entry(gender).or_insert(0) += 1;
            }
        }

        if stats.total_patients > 0 {
            stats.average_age = age_sum as f64 / stats.total_patients as f64;
        }
        stats
    }

    /// Count for a single gender, 0 when absent.
    pub fn gender_count(&self, gender: Gender) -> usize {
        self.gender_distribution.get(&gender).copied().unwrap_or(0)
    }

    /// Serialize as pretty JSON for the dashboard.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
