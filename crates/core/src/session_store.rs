//! Session collection with composite identity and optional reference validation.
//!
//! Sessions are identified by `(patient id, start timestamp)`; the patient id compares
//! case-insensitively, the timestamp exactly. The composite key is not enforced as unique:
//! [`SessionStore::update`] replaces the first match and [`SessionStore::remove`] removes
//! every match.
//!
//! A store built with [`SessionStore::validated`] checks on every add and update that the
//! patient exists and, when a supervisor is named, that the supervisor exists. Those checks
//! take the patient and supervisor read locks while this store's write lock is held.

use crate::error::{LoadError, StoreError, StoreResult};
use crate::models::{ids_match, RecordKind, Session};
use crate::store::{Change, PatientStore, Record, RecordStore, SupervisorStore};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct References {
    patients: Arc<PatientStore>,
    supervisors: Arc<SupervisorStore>,
}

impl References {
    fn check(&self, session: &Session) -> StoreResult<()> {
        let blank_patient = session.patient_id.trim().is_empty();
        if blank_patient || self.patients.get_by_id(&session.patient_id).is_none() {
            return Err(StoreError::ReferenceNotFound {
                kind: RecordKind::Patient,
                id: session.patient_id.clone(),
            });
        }

        if session.has_supervisor() && self.supervisors.get_by_id(&session.supervisor_id).is_none()
        {
            return Err(StoreError::ReferenceNotFound {
                kind: RecordKind::Supervisor,
                id: session.supervisor_id.clone(),
            });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct SessionStore {
    records: RecordStore<Session>,
    references: Option<References>,
}

impl SessionStore {
    /// A store that accepts any patient and supervisor id.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            records: RecordStore::new(path),
            references: None,
        }
    }

    /// A store that rejects sessions referencing unknown patients or supervisors.
    pub fn validated(
        path: impl Into<PathBuf>,
        patients: Arc<PatientStore>,
        supervisors: Arc<SupervisorStore>,
    ) -> Self {
        Self {
            records: RecordStore::new(path),
            references: Some(References {
                patients,
                supervisors,
            }),
        }
    }

    pub fn is_validated(&self) -> bool {
        self.references.is_some()
    }

    pub fn path(&self) -> &Path {
        self.records.path()
    }

    pub fn get_all(&self) -> Vec<Session> {
        self.records.get_all()
    }

    /// Sessions of one patient, in file order.
    pub fn get_by_patient(&self, patient_id: &str) -> Vec<Session> {
        self.records
            .select(|session| ids_match(&session.patient_id, patient_id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_load_error(&self) -> Option<LoadError> {
        self.records.last_load_error()
    }

    pub fn reload(&self) {
        self.records.reload();
    }

    /// Appends a session, filling in an unset start timestamp with the current time.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ReferenceNotFound`] in validated mode, for a blank or unknown patient
    ///   or an unknown supervisor
    /// - [`StoreError::FileWrite`] / [`StoreError::Serialization`] if persisting fails
    pub fn add(&self, mut session: Session) -> StoreResult<Session> {
        let stored = self.records.mutate(|sessions| {
            self.check_references(&session)?;
            session.normalize();
            sessions.push(session.clone());
            Ok(Change::Changed(session))
        })?;

        tracing::info!(
            patient_id = %stored.patient_id,
            started_at = %stored.started_at,
            "added session"
        );
        Ok(stored)
    }

    /// Replaces the first session with the same patient id and start timestamp.
    ///
    /// Returns `false` without validating anything when no session matches.
    pub fn update(&self, mut session: Session) -> StoreResult<bool> {
        self.records.mutate(|sessions| {
            let Some(index) = sessions
                .iter()
                .position(|existing| existing.is_identified_by(&session.patient_id, &session.started_at))
            else {
                return Ok(Change::Unchanged(false));
            };

            self.check_references(&session)?;
            session.normalize();
            sessions[index] = session;
            Ok(Change::Changed(true))
        })
    }

    /// Removes every session with this patient id and start timestamp.
    pub fn remove(&self, patient_id: &str, started_at: &DateTime<Utc>) -> StoreResult<bool> {
        let removed = self.records.mutate(|sessions| {
            let before = sessions.len();
            sessions.retain(|existing| !existing.is_identified_by(patient_id, started_at));
            Ok(Change::removed(before - sessions.len()))
        })?;

        Ok(removed > 0)
    }

    /// Removes every session of a patient and returns how many were removed.
    ///
    /// A blank patient id removes nothing.
    pub fn remove_all_by_patient(&self, patient_id: &str) -> StoreResult<usize> {
        if patient_id.trim().is_empty() {
            return Ok(0);
        }

        let removed = self.records.mutate(|sessions| {
            let before = sessions.len();
            sessions.retain(|existing| !ids_match(&existing.patient_id, patient_id));
            Ok(Change::removed(before - sessions.len()))
        })?;

        if removed > 0 {
            tracing::info!(patient_id, removed, "removed sessions of patient");
        }
        Ok(removed)
    }

    fn check_references(&self, session: &Session) -> StoreResult<()> {
        match &self.references {
            Some(references) => references.check(session),
            None => Ok(()),
        }
    }
}
