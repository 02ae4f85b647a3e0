//! # Hospital Core
//!
//! Record persistence for the hospital rehabilitation application.
//!
//! Patients, supervisors, therapy sessions and environment presets are stored as JSON files in
//! one data directory. This crate loads each collection lazily, caches it in memory behind a
//! reader/writer lock and rewrites the whole file after every successful change.
//!
//! - [`StoreRegistry`]: builds the stores from a [`CoreConfig`] and wires the patient -> session
//!   cascade
//! - [`RecordStore`]: the generic store behind [`PatientStore`], [`SupervisorStore`] and
//!   [`EnvironmentStore`]
//! - [`SessionStore`]: sessions, keyed by patient id and start timestamp
//!
//! **No presentation concerns**: forms, scenes and command-line handling belong in the
//! callers (see the `hospital-cli` crate).

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod registry;
pub mod session_store;
pub mod store;
pub mod timestamp;

pub use config::{CoreConfig, PathStrategy};
pub use error::{LoadError, StoreError, StoreResult};
pub use models::{
    Environment, EnvironmentConfiguration, Patient, RecordKind, Session, Supervisor,
};
pub use registry::StoreRegistry;
pub use session_store::SessionStore;
pub use store::{
    EnvironmentStore, KeyedRecord, PatientStore, Record, RecordStore, RemovalObserver,
    SupervisorStore,
};
