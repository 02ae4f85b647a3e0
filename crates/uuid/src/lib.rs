//! Record identifier utilities.
//!
//! Every record store that owns a single-field identity (patients, supervisors,
//! environments) allocates identifiers for records added without one. Generated
//! identifiers follow one canonical shape:
//!
//! `<prefix>-<32 lowercase hex characters>`
//!
//! Example: `patient-550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - The hex part is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Identifiers supplied by callers are *not* required to follow this shape (files written by
//!   hand use ids such as `env-forest`). Use [`RecordId::parse`] only when you need to know
//!   whether a value was generated by this crate.

mod service;

pub use service::{RecordId, Uuid};
