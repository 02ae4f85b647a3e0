//! Internal implementation of record identifiers.

use std::fmt;

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// A generated record identifier: a kind prefix followed by a canonical UUID.
///
/// Once constructed, the prefix is non-empty and the UUID part renders as 32 lowercase hex
/// characters without hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    prefix: String,
    uuid: Uuid,
}

impl RecordId {
    /// Generates a fresh identifier for the given kind prefix (for example `"patient"`).
    ///
    /// The UUID part is random (RFC 4122 version 4), so identifiers are globally unique
    /// without coordination between stores or processes.
    pub fn generate(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            uuid: Uuid::new_v4(),
        }
    }

    /// Parses an identifier previously produced by [`RecordId::generate`].
    ///
    /// Returns `None` when `input` is not `<prefix>-<32 lowercase hex>`. The prefix itself may
    /// contain hyphens; the UUID part is always the final 32 characters.
    pub fn parse(input: &str) -> Option<Self> {
        let (prefix, token) = input.rsplit_once('-')?;
        if prefix.is_empty() || !Self::is_canonical(token) {
            return None;
        }
        let uuid = Uuid::parse_str(token).ok()?;
        Some(Self {
            prefix: prefix.to_string(),
            uuid,
        })
    }

    /// Returns true if `input` is a canonical UUID token (32 lowercase hex characters).
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.uuid.simple())
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}
