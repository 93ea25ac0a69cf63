//! Voice enrollment and verification.
//!
//! # Architecture
//!
//! The pipeline composes the leaf crates into two operations owned by
//! [`VerificationController`]:
//!
//! 1. Enrollment: decode -> trim -> extract over up to three reference
//!    recordings, persisted positionally as the user's [`ReferenceSet`]
//! 2. Identification: fetch the latest attempt -> decode -> trim ->
//!    extract -> score against the reference set -> threshold decision ->
//!    persist the outcome on the attempt row
//!
//! Identification drives the [`AttemptState`] machine strictly in order;
//! a stage failure leaves the attempt unresolved (`identified` unset),
//! which keeps "could not verify" distinguishable from a completed
//! negative match.
//!
//! Storage is reached only through the [`VerifyStore`] trait; the core
//! holds no connection state and never retries storage failures.

mod config;
mod controller;
mod enroll;
mod error;
mod lifecycle;
mod matcher;
mod store;
mod types;

pub use config::{VerifyConfig, DEFAULT_THRESHOLD};
pub use controller::{Enrollment, Identification, VerificationController};
pub use enroll::{build_reference_set, SlotError};
pub use error::{ErrorKind, VerifyError};
pub use lifecycle::AttemptState;
pub use matcher::{decide, score, Metric};
pub use store::{MemoryStore, VerifyStore};
pub use types::{Attempt, ReferenceSet, User, REFERENCE_SLOTS};
