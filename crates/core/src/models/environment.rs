use crate::codec::FileShape;
use crate::constants::{DEFAULT_DURATION_SECS, ENVIRONMENTS_ENVELOPE_FIELD};
use crate::error::{StoreError, StoreResult};
use crate::models::RecordKind;
use crate::store::{KeyedRecord, Record};
use serde::{Deserialize, Serialize};

/// A virtual environment preset a session can take place in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    #[serde(rename = "IdEnvironnement")]
    pub id: String,
    #[serde(rename = "NomEnvironnement")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "PositionsDisponibles")]
    pub start_positions: Vec<String>,
    #[serde(rename = "NiveauxDifficulte")]
    pub difficulty_levels: Vec<String>,
    #[serde(rename = "DureeDefaut")]
    pub default_duration_secs: i32,
    #[serde(rename = "ImagePath")]
    pub image_path: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            start_positions: Vec::new(),
            difficulty_levels: Vec::new(),
            default_duration_secs: DEFAULT_DURATION_SECS,
            image_path: String::new(),
        }
    }
}

impl Record for Environment {
    const KIND: RecordKind = RecordKind::Environment;
    const SHAPE: FileShape = FileShape::Enveloped(ENVIRONMENTS_ENVELOPE_FIELD);
}

impl KeyedRecord for Environment {
    const ID_PREFIX: &'static str = "env";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Settings picked for an upcoming session. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentConfiguration {
    pub environment_id: String,
    pub start_position: String,
    pub difficulty: String,
    pub assistance_level: i32,
    pub duration_secs: i32,
}

impl Default for EnvironmentConfiguration {
    fn default() -> Self {
        Self {
            environment_id: String::new(),
            start_position: String::new(),
            difficulty: String::new(),
            assistance_level: 0,
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl EnvironmentConfiguration {
    /// Default configuration for a preset: its first position, first difficulty level and
    /// default duration.
    pub fn for_environment(environment: &Environment) -> Self {
        Self {
            environment_id: environment.id.clone(),
            start_position: environment.start_positions.first().cloned().unwrap_or_default(),
            difficulty: environment
                .difficulty_levels
                .first()
                .cloned()
                .unwrap_or_default(),
            assistance_level: 0,
            duration_secs: effective_duration(environment.default_duration_secs),
        }
    }

    /// Picks a start position offered by the preset.
    pub fn with_position(mut self, environment: &Environment, position: &str) -> StoreResult<Self> {
        self.start_position = pick(&environment.start_positions, position, "start position", environment)?;
        Ok(self)
    }

    /// Picks a difficulty level offered by the preset.
    pub fn with_difficulty(
        mut self,
        environment: &Environment,
        difficulty: &str,
    ) -> StoreResult<Self> {
        self.difficulty = pick(&environment.difficulty_levels, difficulty, "difficulty level", environment)?;
        Ok(self)
    }

    pub fn with_assistance_level(mut self, level: i32) -> Self {
        self.assistance_level = level;
        self
    }

    pub fn with_duration(mut self, duration_secs: i32) -> Self {
        self.duration_secs = effective_duration(duration_secs);
        self
    }
}

fn effective_duration(duration_secs: i32) -> i32 {
    if duration_secs > 0 {
        duration_secs
    } else {
        DEFAULT_DURATION_SECS
    }
}

fn pick(offered: &[String], wanted: &str, what: &str, environment: &Environment) -> StoreResult<String> {
    offered
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(wanted.trim()))
        .cloned()
        .ok_or_else(|| {
            StoreError::InvalidArgument(format!(
                "{what} '{wanted}' is not offered by environment '{}'",
                environment.id
            ))
        })
}
