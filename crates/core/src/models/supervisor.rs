use crate::codec::FileShape;
use crate::models::RecordKind;
use crate::store::{KeyedRecord, Record};
use serde::{Deserialize, Serialize};

/// A clinician who may supervise therapy sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supervisor {
    #[serde(rename = "IdSuperviseur")]
    pub id: String,
    #[serde(rename = "Nom")]
    pub last_name: String,
    #[serde(rename = "Prenom")]
    pub first_name: String,
    #[serde(rename = "fonction")]
    pub role: String,
}

impl Supervisor {
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            role: role.into(),
        }
    }
}

impl Record for Supervisor {
    const KIND: RecordKind = RecordKind::Supervisor;
    const SHAPE: FileShape = FileShape::Flat;
}

impl KeyedRecord for Supervisor {
    const ID_PREFIX: &'static str = "sup";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
