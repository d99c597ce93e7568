//! Patient database operations.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};

use super::{ConnectionProvider, Database, StorageError};
use crate::error::PatientResult;
use crate::models::{Gender, Patient, PatientId};
use crate::validation::require_id;

/// CRUD over persisted patients.
///
/// Callers validate payloads before `insert`/`update`; the repository only
/// refuses an update without an ID.
pub trait PatientRepository {
    /// Persist a new patient and return the store-assigned ID.
    fn insert(&mut self, patient: &Patient) -> PatientResult<PatientId>;

    /// Look up one patient. A missing row is `Ok(None)`.
    fn get_by_id(&mut self, patient_id: PatientId) -> PatientResult<Option<Patient>>;

    /// All patients ordered by last name, then first name.
    fn get_all(&mut self) -> PatientResult<Vec<Patient>>;

    /// Overwrite the mutable fields of an existing patient.
    fn update(&mut self, patient: &Patient) -> PatientResult<bool>;

    /// Remove a patient.
    fn delete(&mut self, patient_id: PatientId) -> PatientResult<bool>;
}

const PATIENT_COLUMNS: &str = r#"
    patient_id, first_name, last_name, date_of_birth, gender,
    phone, email, address, emergency_contact, emergency_phone,
    blood_type, registration_date, created_by
"#;

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        patient_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        emergency_contact: row.get(8)?,
        emergency_phone: row.get(9)?,
        blood_type: row.get(10)?,
        registration_date: row.get(11)?,
        created_by: row.get(12)?,
    })
}

impl PatientRepository for Database {
    fn insert(&mut self, patient: &Patient) -> PatientResult<PatientId> {
        let registration_date = patient
            .registration_date
            .unwrap_or_else(|| self.clock().now());

        let conn = self.acquire()?;
        let rows_affected = conn.execute(
            r#"
            INSERT INTO patients (
                first_name, last_name, date_of_birth, gender, phone, email,
                address, emergency_contact, emergency_phone, blood_type,
                registration_date, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.phone,
                patient.email,
                patient.address,
                patient.emergency_contact,
                patient.emergency_phone,
                patient.blood_type,
                registration_date,
                patient.created_by,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::NoRowsAffected("Inserting patient").into());
        }

        match conn.last_insert_rowid() {
            0 => Err(StorageError::MissingGeneratedId.into()),
            id => Ok(id),
        }
    }

    fn get_by_id(&mut self, patient_id: PatientId) -> PatientResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?");
        self.acquire()?
            .query_row(&sql, [patient_id], patient_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn get_all(&mut self) -> PatientResult<Vec<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name");
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], patient_from_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn update(&mut self, patient: &Patient) -> PatientResult<bool> {
        require_id(patient)?;

        let rows_affected = self.acquire()?.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                date_of_birth = ?4,
                gender = ?5,
                phone = ?6,
                email = ?7,
                address = ?8,
                emergency_contact = ?9,
                emergency_phone = ?10,
                blood_type = ?11
            WHERE patient_id = ?1
            "#,
            params![
                patient.patient_id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.phone,
                patient.email,
                patient.address,
                patient.emergency_contact,
                patient.emergency_phone,
                patient.blood_type,
            ],
        )?;
        Ok(rows_affected == 1)
    }

    fn delete(&mut self, patient_id: PatientId) -> PatientResult<bool> {
        let rows_affected = self
            .acquire()?
            .execute("DELETE FROM patients WHERE patient_id = ?", [patient_id])?;
        Ok(rows_affected > 0)
    }
}
