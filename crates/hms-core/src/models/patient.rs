//! Patient models.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned patient identifier. `0` marks a record that was never saved.
pub type PatientId = i64;

/// Recorded gender of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Returned when a stored or supplied gender name is not one of the known values.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown gender: {0}")]
pub struct UnknownGender(pub String);

impl Gender {
    /// All variants, in display order.
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    /// Name as persisted in the `gender` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

/// A person under care.
///
/// Two records are the same patient when their `patient_id` matches; the
/// remaining fields do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Store-assigned ID, `0` until persisted
    pub patient_id: PatientId,
    pub first_name: String,
    pub last_name: String,
    /// Required for persistence, must not be in the future
    pub date_of_birth: Option<NaiveDate>,
    /// Required for persistence
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Emergency contact name
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    /// Free text, stored upper-case (e.g. "O+", "AB-")
    pub blood_type: Option<String>,
    /// Fixed on first insert; defaults to the clock's "now"
    pub registration_date: Option<NaiveDateTime>,
    /// User that registered the patient
    pub created_by: Option<i64>,
}

impl Patient {
    /// Create an unsaved patient with the fields required for persistence.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        gender: Gender,
    ) -> Self {
        Self {
            patient_id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: Some(date_of_birth),
            gender: Some(gender),
            phone: None,
            email: None,
            address: None,
            emergency_contact: None,
            emergency_phone: None,
            blood_type: None,
            registration_date: None,
            created_by: None,
        }
    }

    /// Check if this patient has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.patient_id == 0
    }

    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whole years elapsed between date of birth and `today`.
    ///
    /// Missing or future dates of birth yield 0.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        self.date_of_birth
            .and_then(|dob| today.years_since(dob))
            .unwrap_or(0)
    }

    /// Case-insensitive substring match on first, last or full name.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn name_contains(&self, needle: &str) -> bool {
        self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
            || self.full_name().to_lowercase().contains(needle)
    }
}

impl PartialEq for Patient {
    fn eq(&self, other: &Self) -> bool {
        self.patient_id == other.patient_id
    }
}

impl Eq for Patient {}

impl Hash for Patient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.patient_id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Ann", "Lee", date(2000, 1, 1), Gender::Female);
        assert!(patient.is_new());
        assert_eq!(patient.full_name(), "Ann Lee");
        assert_eq!(patient.gender, Some(Gender::Female));
        assert!(patient.registration_date.is_none());
    }

    #[test]
    fn test_age_boundaries() {
        let patient = Patient::new("Ann", "Lee", date(2000, 6, 15), Gender::Female);

        assert_eq!(patient.age_on(date(2018, 6, 15)), 18);
        assert_eq!(patient.age_on(date(2018, 6, 14)), 17);
        assert_eq!(patient.age_on(date(2000, 6, 15)), 0);
        // Future date of birth
        assert_eq!(patient.age_on(date(1999, 1, 1)), 0);
    }

    #[test]
    fn test_age_leap_day_birthday() {
        let patient = Patient::new("Leap", "Year", date(2000, 2, 29), Gender::Other);
        assert_eq!(patient.age_on(date(2001, 2, 28)), 0);
        assert_eq!(patient.age_on(date(2001, 3, 1)), 1);
    }

    #[test]
    fn test_age_without_date_of_birth() {
        let mut patient = Patient::new("Ann", "Lee", date(2000, 1, 1), Gender::Female);
        patient.date_of_birth = None;
        assert_eq!(patient.age_on(date(2026, 1, 1)), 0);
    }

    #[test]
    fn test_equality_is_by_id() {
        let mut a = Patient::new("Ann", "Lee", date(2000, 1, 1), Gender::Female);
        let mut b = Patient::new("Bob", "Park", date(1980, 5, 5), Gender::Male);
        a.patient_id = 7;
        b.patient_id = 7;
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("MALE".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(Gender::Other.to_string(), "OTHER");
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_name_contains() {
        let patient = Patient::new("Ann", "Lee", date(2000, 1, 1), Gender::Female);
        assert!(patient.name_contains("lee"));
        assert!(patient.name_contains("n l"));
        assert!(!patient.name_contains("park"));
    }
}
