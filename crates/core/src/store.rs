//! Generic JSON-file-backed record store.
//!
//! A [`RecordStore`] owns one collection of one record type. The collection is loaded
//! lazily on first access, cached in memory and guarded by a reader/writer lock owned by
//! the store. Every successful mutation rewrites the whole backing file.
//!
//! ## Locking
//!
//! - reads take the read lock and hand out owned snapshots
//! - writes (add, update, remove, reload) take the write lock
//! - the lazy load checks the loaded flag under a read lock, then takes an upgradable read
//!   lock, re-checks and upgrades to the write lock, so a collection is never loaded twice
//!   and readers are not blocked by the check itself
//!
//! Every store owns its own lock. Stores that call into other stores while holding their
//! write lock (session validation) therefore never contend with themselves.
//!
//! ## Failure policy
//!
//! A missing file loads as an empty collection. An unreadable or unparsable file also loads
//! as an empty collection; the failure is logged and kept as [`RecordStore::last_load_error`].
//! A subsequent write replaces such a file, which drops whatever it held.
//!
//! Mutations are applied to a working copy that replaces the live collection only after the
//! file has been written, so a failed write leaves both memory and disk unchanged.

use crate::codec::{self, FileShape};
use crate::error::{LoadError, StoreError, StoreResult};
use crate::models::{ids_match, Patient, RecordKind};
use hospital_uuid::RecordId;
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

/// A type persisted by a [`RecordStore`].
pub trait Record:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: RecordKind;
    const SHAPE: FileShape;

    /// Write-time normalization, applied to a record when it is added or updated.
    fn normalize(&mut self) {}
}

/// A record identified by a single, case-insensitive string id.
pub trait KeyedRecord: Record {
    /// Prefix of generated ids, e.g. `patient` in `patient-<32 hex>`.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// Notified after records are removed from a store.
///
/// Observers run on the caller's thread after the store has released its lock and before
/// the removing call returns.
pub trait RemovalObserver: Send + Sync {
    fn record_removed(&self, kind: RecordKind, id: &str);
}

pub type PatientStore = RecordStore<Patient>;
pub type SupervisorStore = RecordStore<crate::models::Supervisor>;
pub type EnvironmentStore = RecordStore<crate::models::Environment>;

/// Outcome of a mutation closure passed to [`RecordStore::mutate`].
pub(crate) enum Change<T> {
    /// Nothing changed; the file is not rewritten.
    Unchanged(T),
    /// The working copy changed and must be persisted.
    Changed(T),
}

impl Change<usize> {
    /// A removal count; only a non-zero count rewrites the file.
    pub(crate) fn removed(count: usize) -> Self {
        if count > 0 {
            Change::Changed(count)
        } else {
            Change::Unchanged(0)
        }
    }
}

struct StoreState<R> {
    loaded: bool,
    records: Vec<R>,
    last_load_error: Option<LoadError>,
}

pub struct RecordStore<R: Record> {
    path: PathBuf,
    state: RwLock<StoreState<R>>,
    observers: RwLock<Vec<Weak<dyn RemovalObserver>>>,
    #[cfg(test)]
    loads: std::sync::atomic::AtomicUsize,
}

impl<R: Record> fmt::Debug for RecordStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("kind", &R::KIND)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<R: Record> RecordStore<R> {
    /// Creates a store over `path`. Nothing is read until the first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(StoreState {
                loaded: false,
                records: Vec::new(),
                last_load_error: None,
            }),
            observers: RwLock::new(Vec::new()),
            #[cfg(test)]
            loads: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a snapshot of the whole collection.
    pub fn get_all(&self) -> Vec<R> {
        self.loaded().records.clone()
    }

    pub fn len(&self) -> usize {
        self.loaded().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The failure behind the most recent load, if that load fell back to an empty collection
    /// for any reason other than a missing file.
    pub fn last_load_error(&self) -> Option<LoadError> {
        self.loaded().last_load_error.clone()
    }

    /// Drops the cached collection and reads the backing file again.
    pub fn reload(&self) {
        let mut state = self.state.write();
        state.loaded = false;
        self.load_into(&mut state);
    }

    /// Registers an observer for successful removals. Dropped observers are pruned.
    pub fn subscribe_removal(&self, observer: Weak<dyn RemovalObserver>) {
        let mut observers = self.observers.write();
        observers.retain(|existing| existing.strong_count() > 0);
        observers.push(observer);
    }

    /// Snapshot of the records matching `predicate`.
    pub(crate) fn select(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.loaded()
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Runs `apply` against a working copy of the collection under the write lock.
    ///
    /// The working copy is persisted and becomes the live collection only when `apply`
    /// reports [`Change::Changed`] and the file write succeeds.
    pub(crate) fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<R>) -> StoreResult<Change<T>>,
    ) -> StoreResult<T> {
        let mut state = self.state.write();
        if !state.loaded {
            self.load_into(&mut state);
        }

        let mut working = state.records.clone();
        match apply(&mut working)? {
            Change::Unchanged(value) => Ok(value),
            Change::Changed(value) => {
                self.persist(&working)?;
                state.records = working;
                Ok(value)
            }
        }
    }

    pub(crate) fn notify_removed(&self, id: &str) {
        let (observers, dropped): (Vec<Option<Arc<dyn RemovalObserver>>>, Vec<_>) = self
            .observers
            .read()
            .iter()
            .map(Weak::upgrade)
            .partition(Option::is_some);

        if !dropped.is_empty() {
            tracing::debug!(
                kind = %R::KIND,
                id,
                dropped = dropped.len(),
                "removal observers no longer alive, not notified"
            );
        }

        for observer in observers.into_iter().flatten() {
            observer.record_removed(R::KIND, id);
        }
    }

    /// Number of times the backing file has been read.
    #[cfg(test)]
    pub(crate) fn load_count(&self) -> usize {
        self.loads.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Read guard over a loaded collection, loading it first if needed.
    fn loaded(&self) -> RwLockReadGuard<'_, StoreState<R>> {
        let state = self.state.read();
        if state.loaded {
            return state;
        }
        drop(state);

        let state = self.state.upgradable_read();
        if state.loaded {
            return RwLockUpgradableReadGuard::downgrade(state);
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        self.load_into(&mut state);
        RwLockWriteGuard::downgrade(state)
    }

    fn load_into(&self, state: &mut StoreState<R>) {
        #[cfg(test)]
        self.loads
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let kind = R::KIND;
        let path = self.path.display();

        let (records, error) = match fs::read_to_string(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(%kind, %path, "data file not found, starting with an empty collection");
                (Vec::new(), None)
            }
            Err(e) => {
                tracing::error!(%kind, %path, error = %e, "failed to read data file");
                (Vec::new(), Some(LoadError::FileRead(e.to_string())))
            }
            Ok(raw) => match codec::decode::<R>(&raw) {
                Ok(records) => {
                    if records.is_empty() {
                        tracing::warn!(%kind, %path, "data file contains no records");
                    } else {
                        tracing::info!(%kind, %path, count = records.len(), "loaded records");
                    }
                    (records, None)
                }
                Err(e) => {
                    tracing::error!(%kind, %path, error = %e, "failed to parse data file, starting with an empty collection");
                    (Vec::new(), Some(e))
                }
            },
        };

        state.records = records;
        state.last_load_error = error;
        state.loaded = true;
    }

    fn persist(&self, records: &[R]) -> StoreResult<()> {
        let json = codec::encode(records).map_err(StoreError::Serialization)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(kind = %R::KIND, path = %self.path.display(), count = records.len(), "persisted records");
        Ok(())
    }
}

impl<R: KeyedRecord> RecordStore<R> {
    /// Case-insensitive lookup by id.
    pub fn get_by_id(&self, id: &str) -> Option<R> {
        self.loaded()
            .records
            .iter()
            .find(|record| ids_match(record.id(), id))
            .cloned()
    }

    /// Adds a record, generating an id when it has none.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateId`] if a record with the same id (ignoring case) exists; the
    ///   collection and file are left unchanged
    /// - [`StoreError::FileWrite`] / [`StoreError::Serialization`] if persisting fails
    pub fn add(&self, mut record: R) -> StoreResult<R> {
        let stored = self.mutate(|records| {
            if record.id().trim().is_empty() {
                record.set_id(RecordId::generate(R::ID_PREFIX).into());
            }

            if records.iter().any(|existing| ids_match(existing.id(), record.id())) {
                return Err(StoreError::DuplicateId {
                    kind: R::KIND,
                    id: record.id().to_string(),
                });
            }

            record.normalize();
            records.push(record.clone());
            Ok(Change::Changed(record))
        })?;

        tracing::info!(kind = %R::KIND, id = stored.id(), "added record");
        Ok(stored)
    }

    /// Replaces the record with the same id. Returns `false` when there is none.
    ///
    /// A blank id is looked up like any other; it only matches a stored record whose id is
    /// blank too.
    pub fn update(&self, mut record: R) -> StoreResult<bool> {
        self.mutate(|records| {
            let Some(index) = records
                .iter()
                .position(|existing| ids_match(existing.id(), record.id()))
            else {
                return Ok(Change::Unchanged(false));
            };

            record.normalize();
            records[index] = record;
            Ok(Change::Changed(true))
        })
    }

    /// Removes every record with this id. Returns `false` when none matched.
    ///
    /// Removal observers are notified before this returns.
    pub fn remove(&self, id: &str) -> StoreResult<bool> {
        let removed = self.mutate(|records| {
            let before = records.len();
            records.retain(|existing| !ids_match(existing.id(), id));
            Ok(Change::removed(before - records.len()))
        })?;

        if removed == 0 {
            return Ok(false);
        }

        tracing::info!(kind = %R::KIND, id, "removed record");
        self.notify_removed(id);
        Ok(true)
    }
}

impl RecordStore<Patient> {
    /// Replaces only the follow-up note of a patient. Returns `false` when there is no such
    /// patient.
    pub fn update_follow_up_note(&self, id: &str, note: &str) -> StoreResult<bool> {
        self.mutate(|patients| {
            let Some(patient) = patients.iter_mut().find(|p| ids_match(&p.id, id)) else {
                return Ok(Change::Unchanged(false));
            };
            patient.follow_up = note.to_string();
            Ok(Change::Changed(true))
        })
    }
}

/// Writes `contents` to a sibling temporary file and renames it over `path`.
fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
    }

    let tmp_path = temp_path(path);
    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });

    if let Err(e) = written.and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::FileWrite(e));
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("records.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Environment, Supervisor};
    use crate::timestamp;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::{Barrier, Mutex};
    use std::thread;
    use tempfile::TempDir;

    fn patient_store(temp_dir: &TempDir) -> PatientStore {
        PatientStore::new(temp_dir.path().join("les_patients.json"))
    }

    #[test]
    fn test_add_generates_distinct_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);

        let first = store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("first add should succeed");
        let second = store
            .add(Patient::new("Durand", "Marie", 1975))
            .expect("second add should succeed");

        assert!(first.id.starts_with("patient-"));
        assert!(!second.id.trim().is_empty());
        assert_ne!(first.id, second.id);

        let all = store.get_all();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|p| p.id == first.id));
        assert!(all.iter().any(|p| p.id == second.id));
    }

    #[test]
    fn test_add_rejects_duplicate_id_ignoring_case() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);

        store
            .add(Patient {
                id: "P1".into(),
                ..Patient::new("Dupont", "Jean", 1980)
            })
            .expect("add should succeed");
        let file_before = fs::read_to_string(store.path()).expect("file should exist");

        let err = store
            .add(Patient {
                id: "p1".into(),
                ..Patient::new("Autre", "Patient", 1990)
            })
            .expect_err("duplicate id should fail");

        assert!(matches!(
            err,
            StoreError::DuplicateId { kind: RecordKind::Patient, ref id } if id == "p1"
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(
            fs::read_to_string(store.path()).expect("file should exist"),
            file_before,
            "file should be untouched"
        );
    }

    #[test]
    fn test_get_by_id_is_case_insensitive() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SupervisorStore::new(temp_dir.path().join("les_superviseur.json"));

        store
            .add(Supervisor {
                id: "sup-Claire".into(),
                ..Supervisor::new("Martin", "Claire", "Kinésithérapeute")
            })
            .expect("add should succeed");

        let found = store.get_by_id("SUP-claire").expect("should be found");
        assert_eq!(found.first_name, "Claire");
        assert!(store.get_by_id("sup-other").is_none());
    }

    #[test]
    fn test_update_missing_id_returns_false_without_writing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");
        let snapshot = store.get_all();

        let updated = store
            .update(Patient {
                id: "patient-missing".into(),
                ..Patient::new("Nobody", "Here", 2000)
            })
            .expect("update should not error");

        assert!(!updated);
        assert_eq!(store.get_all(), snapshot);
    }

    #[test]
    fn test_update_blank_id_goes_through_lookup() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);

        let updated = store
            .update(Patient::new("Dupont", "Jean", 1980))
            .expect("blank id is not an error");

        assert!(!updated);
        assert!(!store.path().exists(), "no file should be written");
    }

    #[test]
    fn test_update_blank_id_replaces_loaded_record_without_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("les_patients.json");
        fs::write(&path, r#"[{"Nom": "Sans-id"}, {"IDpatient": "p2", "Nom": "Durand"}]"#)
            .expect("should write fixture");
        let store = PatientStore::new(&path);

        let updated = store
            .update(Patient::new("Corrigé", "Jean", 1980))
            .expect("update should succeed");

        assert!(updated);
        let names: Vec<_> = store.get_all().into_iter().map(|p| p.last_name).collect();
        assert_eq!(names, ["Corrigé", "Durand"]);
    }

    #[test]
    fn test_update_replaces_whole_record_and_normalizes_timestamp() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        let added = store
            .add(Patient {
                pathology: "AVC".into(),
                follow_up: "initial".into(),
                ..Patient::new("Dupont", "Jean", 1980)
            })
            .expect("add should succeed");

        let replacement = Patient {
            id: added.id.to_uppercase(),
            created_at: timestamp::unset(),
            ..Patient::new("Dupont", "Jean-Pierre", 1981)
        };
        assert!(store.update(replacement).expect("update should succeed"));

        let stored = store.get_by_id(&added.id).expect("still present");
        assert_eq!(stored.first_name, "Jean-Pierre");
        assert_eq!(stored.birth_year, 1981);
        assert_eq!(stored.pathology, "", "update is a full replace");
        assert!(!timestamp::is_unset(&stored.created_at));
    }

    #[test]
    fn test_update_follow_up_note_touches_only_the_note() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        let added = store
            .add(Patient {
                pathology: "AVC".into(),
                ..Patient::new("Dupont", "Jean", 1980)
            })
            .expect("add should succeed");

        assert!(store
            .update_follow_up_note(&added.id, "Progrès notables")
            .expect("note update should succeed"));
        assert!(!store
            .update_follow_up_note("patient-missing", "x")
            .expect("missing patient is not an error"));

        let stored = store.get_by_id(&added.id).expect("present");
        assert_eq!(stored.follow_up, "Progrès notables");
        assert_eq!(stored.pathology, "AVC");
        assert_eq!(stored.created_at, added.created_at);
    }

    #[test]
    fn test_remove_removes_all_matches_and_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("les_patients.json");
        fs::write(
            &path,
            r#"[{"IDpatient": "p1"}, {"IDpatient": "P1"}, {"IDpatient": "p2"}]"#,
        )
        .expect("should write fixture");
        let store = PatientStore::new(&path);

        assert!(store.remove("p1").expect("remove should succeed"));
        assert!(!store.remove("p1").expect("second remove should not error"));

        let fresh = PatientStore::new(&path);
        let ids: Vec<_> = fresh.get_all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["p2"]);
    }

    struct RecordingObserver {
        seen: Mutex<Vec<(RecordKind, String)>>,
    }

    impl RemovalObserver for RecordingObserver {
        fn record_removed(&self, kind: RecordKind, id: &str) {
            self.seen.lock().unwrap().push((kind, id.to_string()));
        }
    }

    #[test]
    fn test_remove_notifies_observers_only_on_success() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        let observer = Arc::new(RecordingObserver {
            seen: Mutex::new(Vec::new()),
        });
        let weak: Weak<RecordingObserver> = Arc::downgrade(&observer);
        store.subscribe_removal(weak);

        let added = store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");
        store.remove("patient-missing").expect("remove should not error");
        store.remove(&added.id).expect("remove should succeed");

        let seen = observer.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(RecordKind::Patient, added.id.clone())]);
    }

    #[test]
    fn test_dropped_observer_is_not_called() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        let observer = Arc::new(RecordingObserver {
            seen: Mutex::new(Vec::new()),
        });
        let weak: Weak<RecordingObserver> = Arc::downgrade(&observer);
        store.subscribe_removal(weak);
        drop(observer);

        let added = store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");
        assert!(store.remove(&added.id).expect("remove should succeed"));
    }

    #[test]
    fn test_missing_file_loads_empty_without_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);

        assert!(store.is_empty());
        assert!(store.last_load_error().is_none());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_records_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("les_patients.json");
        fs::write(&path, "{ not json").expect("should write fixture");
        let store = PatientStore::new(&path);

        assert!(store.get_all().is_empty());
        assert!(matches!(
            store.last_load_error(),
            Some(LoadError::Deserialization(_))
        ));
    }

    #[test]
    fn test_round_trip_through_fresh_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        let created_at = Utc.with_ymd_and_hms(2023, 11, 5, 14, 0, 0).unwrap();
        store
            .add(Patient {
                sex: "F".into(),
                neglected_side: "gauche".into(),
                created_at,
                follow_up: "RAS".into(),
                ..Patient::new("Durand", "Marie", 1975)
            })
            .expect("add should succeed");
        store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");

        let fresh = patient_store(&temp_dir);

        let mut original = store.get_all();
        let mut reloaded = fresh.get_all();
        original.sort_by(|a, b| a.id.cmp(&b.id));
        reloaded.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(reloaded, original);
        assert!(reloaded.iter().any(|p| p.created_at == created_at));
    }

    #[test]
    fn test_reload_twice_yields_identical_snapshots() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = patient_store(&temp_dir);
        store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");

        store.reload();
        let first = store.get_all();
        store.reload();
        let second = store.get_all();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_reload_is_stable_when_file_lacks_creation_date() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("les_patients.json");
        fs::write(&path, r#"[{"IDpatient": "p1", "Nom": "Dupont"}]"#).expect("should write");
        let store = PatientStore::new(&path);

        store.reload();
        let first = store.get_all();
        store.reload();
        let second = store.get_all();

        assert_eq!(first, second);
        assert!(timestamp::is_unset(&first[0].created_at));
        assert_eq!(PatientStore::new(&path).get_all(), first);
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("les_patients.json");
        let store = PatientStore::new(&path);
        assert!(store.is_empty());

        fs::write(&path, r#"[{"IDpatient": "p9", "Nom": "Externe"}]"#).expect("should write");
        assert!(store.is_empty(), "cached collection is not re-read implicitly");

        store.reload();
        assert_eq!(store.get_by_id("p9").expect("reloaded").last_name, "Externe");
    }

    #[test]
    fn test_concurrent_adds_produce_distinct_ids() {
        const WRITERS: usize = 16;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(patient_store(&temp_dir));

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .add(Patient::new(format!("Patient{i}"), "Test", 1950 + i as i32))
                        .expect("concurrent add should succeed")
                        .id
                })
            })
            .collect();

        let ids: HashSet<String> = handles
            .into_iter()
            .map(|handle| handle.join().expect("writer thread should not panic"))
            .collect();

        assert_eq!(ids.len(), WRITERS);
        assert_eq!(store.len(), WRITERS);
        assert_eq!(patient_store(&temp_dir).len(), WRITERS, "file holds every record");
    }

    #[test]
    fn test_concurrent_first_reads_load_once() {
        const READERS: usize = 8;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("environnements.json");
        fs::write(
            &path,
            r#"[{"Environnements": [{"IdEnvironnement": "env-forest"}, {"IdEnvironnement": "env-beach"}]}]"#,
        )
        .expect("should write fixture");
        let store = Arc::new(EnvironmentStore::new(&path));
        let start = Arc::new(Barrier::new(READERS));

        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    store.get_all().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("reader should not panic"), 2);
        }
        assert_eq!(store.load_count(), 1);

        store.reload();
        assert_eq!(store.load_count(), 2, "reload reads the file again");
        assert_eq!(store.len(), 2);
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn test_empty_environment_file_loads_without_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("environnements.json");
        fs::write(&path, r#"[{"Environnements": []}]"#).expect("should write fixture");
        let store = EnvironmentStore::new(&path);

        assert_eq!(store.get_all().len(), 0);
        assert!(store.last_load_error().is_none());
    }

    #[test]
    fn test_environment_add_writes_single_envelope() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("environnements.json");
        fs::write(
            &path,
            r#"[{"Environnements": [{"IdEnvironnement": "env-a"}]}, {"Environnements": [{"IdEnvironnement": "env-b"}]}]"#,
        )
        .expect("should write fixture");
        let store = EnvironmentStore::new(&path);

        let added = store
            .add(Environment {
                name: "Plage".into(),
                ..Environment::default()
            })
            .expect("add should succeed");
        assert!(added.id.starts_with("env-"));

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("file exists")).expect("json");
        let wrappers = document.as_array().expect("array");
        assert_eq!(wrappers.len(), 1);
        assert_eq!(wrappers[0]["Environnements"].as_array().expect("list").len(), 3);
    }

    #[test]
    fn test_write_creates_parent_dirs_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("data").join("les_patients.json");
        let store = PatientStore::new(&path);

        store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect("add should succeed");

        assert!(path.is_file());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_failed_write_leaves_collection_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // A directory sitting where the file should be makes the rename fail.
        let path = temp_dir.path().join("les_patients.json");
        fs::create_dir_all(path.join("occupied")).expect("should create blocking dir");
        let store = PatientStore::new(&path);

        let err = store
            .add(Patient::new("Dupont", "Jean", 1980))
            .expect_err("write should fail");

        assert!(matches!(err, StoreError::FileWrite(_)));
        assert!(store.is_empty());
        assert!(!temp_path(&path).exists());
    }
}
