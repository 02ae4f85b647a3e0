//! Single entry point to the four record stores.
//!
//! A [`StoreRegistry`] is built once from a [`CoreConfig`] and cloned wherever the stores are
//! needed. Each store is constructed on first use and then shared by every clone. The
//! session store is always built in validated mode, and removing a patient through
//! [`StoreRegistry::patients`] also removes that patient's sessions.

use crate::config::CoreConfig;
use crate::models::RecordKind;
use crate::session_store::SessionStore;
use crate::store::{EnvironmentStore, PatientStore, RemovalObserver, SupervisorStore};
use std::path::Path;
use std::sync::{Arc, OnceLock, Weak};

#[derive(Clone, Debug)]
pub struct StoreRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    cfg: Arc<CoreConfig>,
    this: Weak<RegistryInner>,
    patients: OnceLock<Arc<PatientStore>>,
    supervisors: OnceLock<Arc<SupervisorStore>>,
    sessions: OnceLock<Arc<SessionStore>>,
    environments: OnceLock<Arc<EnvironmentStore>>,
}

impl StoreRegistry {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let inner = Arc::new_cyclic(|this| RegistryInner {
            cfg,
            this: this.clone(),
            patients: OnceLock::new(),
            supervisors: OnceLock::new(),
            sessions: OnceLock::new(),
            environments: OnceLock::new(),
        });
        Self { inner }
    }

    pub fn base_dir(&self) -> &Path {
        self.inner.cfg.base_dir()
    }

    /// The patient store. Removals cascade to sessions only while at least one registry
    /// handle is alive; a store `Arc` kept past the last handle removes patients without
    /// touching their sessions (logged at debug level).
    pub fn patients(&self) -> &Arc<PatientStore> {
        self.inner.patients()
    }

    pub fn supervisors(&self) -> &Arc<SupervisorStore> {
        self.inner.supervisors()
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        self.inner.sessions()
    }

    pub fn environments(&self) -> &Arc<EnvironmentStore> {
        self.inner.environments()
    }
}

impl RegistryInner {
    fn patients(&self) -> &Arc<PatientStore> {
        self.patients.get_or_init(|| {
            let store = Arc::new(PatientStore::new(self.cfg.patients_path()));
            let observer: Weak<dyn RemovalObserver> = self.this.clone();
            store.subscribe_removal(observer);
            store
        })
    }

    fn supervisors(&self) -> &Arc<SupervisorStore> {
        self.supervisors
            .get_or_init(|| Arc::new(SupervisorStore::new(self.cfg.supervisors_path())))
    }

    fn sessions(&self) -> &Arc<SessionStore> {
        self.sessions.get_or_init(|| {
            Arc::new(SessionStore::validated(
                self.cfg.sessions_path(),
                Arc::clone(self.patients()),
                Arc::clone(self.supervisors()),
            ))
        })
    }

    fn environments(&self) -> &Arc<EnvironmentStore> {
        self.environments
            .get_or_init(|| Arc::new(EnvironmentStore::new(self.cfg.environments_path())))
    }
}

impl RemovalObserver for RegistryInner {
    fn record_removed(&self, kind: RecordKind, id: &str) {
        if kind != RecordKind::Patient {
            return;
        }

        match self.sessions().remove_all_by_patient(id) {
            Ok(0) => {}
            Ok(removed) => {
                tracing::info!(patient_id = id, removed, "cascaded patient removal to sessions");
            }
            Err(e) => {
                tracing::error!(patient_id = id, error = %e, "failed to remove sessions of removed patient");
            }
        }
    }
}
