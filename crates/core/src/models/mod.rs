//! Persisted record types.
//!
//! Field names on the wire are kept identical to the data files already in circulation;
//! the Rust field names describe what each value means. Every record type deserializes
//! leniently: missing fields take their default, unknown fields are ignored.

mod environment;
mod patient;
mod session;
mod supervisor;

pub use environment::{Environment, EnvironmentConfiguration};
pub use patient::Patient;
pub use session::Session;
pub use supervisor::Supervisor;

use std::fmt;

/// The four collections managed by the store layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Patient,
    Supervisor,
    Session,
    Environment,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Patient => "patient",
            RecordKind::Supervisor => "supervisor",
            RecordKind::Session => "session",
            RecordKind::Environment => "environment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive identifier comparison used for every record identity.
pub fn ids_match(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}
