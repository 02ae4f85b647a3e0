use crate::codec::FileShape;
use crate::models::RecordKind;
use crate::store::{KeyedRecord, Record};
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A patient followed by the rehabilitation team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    #[serde(rename = "IDpatient")]
    pub id: String,
    #[serde(rename = "Nom")]
    pub last_name: String,
    #[serde(rename = "Prenom")]
    pub first_name: String,
    #[serde(rename = "date_de_naissance")]
    pub birth_year: i32,
    #[serde(rename = "Sexe")]
    pub sex: String,
    #[serde(rename = "Pathologie")]
    pub pathology: String,
    #[serde(rename = "CoteNeglige")]
    pub neglected_side: String,
    /// Unset when absent from the file; filled in on add and update.
    #[serde(rename = "DateCreation", with = "timestamp::utc", default = "timestamp::unset")]
    pub created_at: DateTime<Utc>,
    /// Free-text follow-up note, editable on its own through
    /// [`PatientStore::update_follow_up_note`](crate::PatientStore::update_follow_up_note).
    #[serde(rename = "SuiviPatient")]
    pub follow_up: String,
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            id: String::new(),
            last_name: String::new(),
            first_name: String::new(),
            birth_year: 0,
            sex: String::new(),
            pathology: String::new(),
            neglected_side: String::new(),
            created_at: Utc::now(),
            follow_up: String::new(),
        }
    }
}

impl Patient {
    pub fn new(last_name: impl Into<String>, first_name: impl Into<String>, birth_year: i32) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            birth_year,
            ..Self::default()
        }
    }
}

impl Record for Patient {
    const KIND: RecordKind = RecordKind::Patient;
    const SHAPE: FileShape = FileShape::Flat;

    fn normalize(&mut self) {
        self.created_at = timestamp::normalize(self.created_at);
    }
}

impl KeyedRecord for Patient {
    const ID_PREFIX: &'static str = "patient";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
