use crate::codec::FileShape;
use crate::constants::SESSIONS_ENVELOPE_FIELD;
use crate::models::{ids_match, EnvironmentConfiguration, RecordKind};
use crate::store::Record;
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One therapy session.
///
/// Sessions have no identifier of their own: a session is identified by the patient it
/// belongs to together with its start timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    #[serde(rename = "IDpatient")]
    pub patient_id: String,
    #[serde(rename = "EnvironnementUtilise")]
    pub environment_id: String,
    #[serde(rename = "PositionDepart")]
    pub start_position: String,
    #[serde(rename = "DateDebut", with = "timestamp::utc")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "niveauDifficulte")]
    pub difficulty: String,
    #[serde(rename = "NiveauAssistance_moyen")]
    pub mean_assistance_level: i32,
    #[serde(rename = "ObjectifsAtteints")]
    pub objectives_reached: String,
    #[serde(rename = "ObjectifsManques")]
    pub objectives_missed: String,
    #[serde(rename = "duree")]
    pub duration_secs: i32,
    #[serde(rename = "ScoreTotal")]
    pub total_score: i32,
    /// Blank when the session was not supervised.
    #[serde(rename = "IdSuperviseur")]
    pub supervisor_id: String,
    #[serde(rename = "TempsReaction")]
    pub reaction_time: f64,
    #[serde(rename = "PrecisionPointage")]
    pub pointing_precision: f64,
    #[serde(rename = "Commentaire")]
    pub comment: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            patient_id: String::new(),
            environment_id: String::new(),
            start_position: String::new(),
            started_at: timestamp::unset(),
            difficulty: String::new(),
            mean_assistance_level: 0,
            objectives_reached: String::new(),
            objectives_missed: String::new(),
            duration_secs: 0,
            total_score: 0,
            supervisor_id: String::new(),
            reaction_time: 0.0,
            pointing_precision: 0.0,
            comment: String::new(),
        }
    }
}

impl Session {
    /// Seeds a session from the configuration chosen before it starts.
    ///
    /// Results (score, objectives, timings) are left at their defaults; the start timestamp
    /// stays unset and is filled in when the session is stored.
    pub fn from_configuration(
        patient_id: impl Into<String>,
        configuration: &EnvironmentConfiguration,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            environment_id: configuration.environment_id.clone(),
            start_position: configuration.start_position.clone(),
            difficulty: configuration.difficulty.clone(),
            mean_assistance_level: configuration.assistance_level,
            duration_secs: configuration.duration_secs,
            ..Self::default()
        }
    }

    /// True when this session is the one identified by `(patient_id, started_at)`.
    pub fn is_identified_by(&self, patient_id: &str, started_at: &DateTime<Utc>) -> bool {
        ids_match(&self.patient_id, patient_id) && self.started_at == *started_at
    }

    pub fn has_supervisor(&self) -> bool {
        !self.supervisor_id.trim().is_empty()
    }
}

impl Record for Session {
    const KIND: RecordKind = RecordKind::Session;
    const SHAPE: FileShape = FileShape::Enveloped(SESSIONS_ENVELOPE_FIELD);

    fn normalize(&mut self) {
        self.started_at = timestamp::normalize(self.started_at);
    }
}
