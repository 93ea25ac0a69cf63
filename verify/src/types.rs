//! Row types shared with the storage collaborator.
//!
//! The core operates on in-memory copies of these rows and issues
//! explicit write commands keyed by rid; it never holds a live storage
//! connection across calls and never deletes either entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voxgate_mfcc::Embedding;

/// Number of reference recording/embedding slots per user.
pub const REFERENCE_SLOTS: usize = 3;

/// The enrolled reference embeddings of one user, positional.
///
/// Slot N maps to a fixed storage column; slots hold the empty
/// [`Embedding`] until enrollment populates them. Partial enrollment is
/// valid: empty slots are excluded from matching, never treated as zero
/// vectors.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSet {
    slots: [Embedding; REFERENCE_SLOTS],
}

impl ReferenceSet {
    pub fn new(slots: [Embedding; REFERENCE_SLOTS]) -> Self {
        Self { slots }
    }

    /// A set with every slot empty (the pre-enrollment state).
    pub fn empty() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    pub fn slots(&self) -> &[Embedding; REFERENCE_SLOTS] {
        &self.slots
    }

    /// Iterates over the non-empty slots.
    pub fn available(&self) -> impl Iterator<Item = &Embedding> {
        self.slots.iter().filter(|e| !e.is_empty())
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    pub fn is_fully_empty(&self) -> bool {
        self.available_count() == 0
    }
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ReferenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSet")
            .field("available", &self.available_count())
            .finish()
    }
}

/// Identity root. Created outside the core; the core only rewrites the
/// reference set.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal numeric key.
    pub id: i64,
    /// Stable external identifier, immutable.
    pub rid: Uuid,
    /// Raw enrollment recordings, positional, write-once at signup.
    pub recordings: [Option<Vec<u8>>; REFERENCE_SLOTS],
    /// Enrolled reference embeddings.
    pub references: ReferenceSet,
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<Option<usize>> = self
            .recordings
            .iter()
            .map(|r| r.as_ref().map(|b| b.len()))
            .collect();
        f.debug_struct("User")
            .field("id", &self.id)
            .field("rid", &self.rid)
            .field("recording_bytes", &sizes)
            .field("references", &self.references)
            .finish()
    }
}

/// One identification event.
///
/// `identified` stays `None` until the verification pipeline runs to
/// completion for this attempt, and is then set exactly once. A failed
/// run leaves it `None`, which keeps "could not verify" distinguishable
/// from a completed negative match. A new login creates a new row.
#[derive(Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub rid: Uuid,
    pub user_rid: Uuid,
    /// Raw login recording, write-once at creation.
    pub recording: Vec<u8>,
    pub identified: Option<bool>,
    /// The attempt's own computed embedding, stored on resolution for
    /// audit.
    pub embedding: Embedding,
    /// Selects the "latest" attempt of a user.
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempt")
            .field("id", &self.id)
            .field("rid", &self.rid)
            .field("user_rid", &self.user_rid)
            .field("recording_bytes", &self.recording.len())
            .field("identified", &self.identified)
            .field("created_at", &self.created_at)
            .finish()
    }
}
