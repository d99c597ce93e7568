//! SQLite schema definition.

/// Database schema, applied to every new connection.
pub const SCHEMA: &str = r#"
-- Foreign keys are per-connection in SQLite
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users (directory owned by the authentication layer)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('ADMIN', 'DOCTOR', 'NURSE')),
    email TEXT,
    phone TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Default administrator (user_id 1)
INSERT OR IGNORE INTO users (username, full_name, role, email)
VALUES ('admin', 'System Administrator', 'ADMIN', 'admin@hms.com');

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,                 -- YYYY-MM-DD
    gender TEXT NOT NULL CHECK (gender IN ('MALE', 'FEMALE', 'OTHER')),
    phone TEXT,
    email TEXT,
    address TEXT,
    emergency_contact TEXT,
    emergency_phone TEXT,
    blood_type TEXT,
    registration_date TEXT DEFAULT CURRENT_TIMESTAMP,
    created_by INTEGER REFERENCES users(user_id)
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name);
CREATE INDEX IF NOT EXISTS idx_patients_created_by ON patients(created_by);
"#;
