//! Constants used throughout the hospital core crate.
//!
//! File names and folder names are shared with data files written by earlier versions of
//! the application, so they must not change.

/// Filename for the patient collection.
pub const PATIENTS_FILENAME: &str = "les_patients.json";

/// Filename for the supervisor collection.
pub const SUPERVISORS_FILENAME: &str = "les_superviseur.json";

/// Filename for the session collection.
pub const SESSIONS_FILENAME: &str = "sessions.json";

/// Filename for the environment presets.
pub const ENVIRONMENTS_FILENAME: &str = "environnements.json";

/// Project-relative data folder used during development.
pub const DEVELOPMENT_DATA_DIR: &str = "HospitalData/StreamingAssets";

/// Application-relative data folder used by packaged builds.
pub const PACKAGED_DATA_DIR: &str = "StreamingAssets/HospitalData";

/// Envelope field holding the session list.
pub const SESSIONS_ENVELOPE_FIELD: &str = "Sessions";

/// Envelope field holding the environment list.
pub const ENVIRONMENTS_ENVELOPE_FIELD: &str = "Environnements";

/// Default session duration in seconds.
pub const DEFAULT_DURATION_SECS: i32 = 60;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HOSPITAL_DATA_DIR";

/// Environment variable selecting the path resolution strategy.
pub const DATA_MODE_ENV: &str = "HOSPITAL_DATA_MODE";
