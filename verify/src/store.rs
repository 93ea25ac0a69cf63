//! Storage contract and an in-memory implementation.
//!
//! The storage internals (connection pooling, credentials, SQL) belong to
//! an external collaborator; the core only depends on this narrow trait.
//! [`MemoryStore`] implements it for tests and ephemeral use.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use voxgate_mfcc::Embedding;

use crate::error::VerifyError;
use crate::types::{Attempt, ReferenceSet, User, REFERENCE_SLOTS};

/// Persistence seam of the verification core.
///
/// Every operation may suspend. Writes are keyed by rid, never by a
/// position ("latest") re-resolved at write time, so two concurrent
/// pipeline runs cannot clobber each other's outcomes.
#[async_trait]
pub trait VerifyStore: Send + Sync {
    /// Loads a user row. `NotFound` if no user has this rid.
    async fn fetch_user(&self, rid: Uuid) -> Result<User, VerifyError>;

    /// Loads the user's most recent attempt by creation timestamp.
    /// `NotFound` if the user has no attempts.
    async fn fetch_latest_attempt(&self, user_rid: Uuid) -> Result<Attempt, VerifyError>;

    /// Replaces all three reference slots of a user in one atomic write:
    /// a concurrent reader sees either the old set or the new set, never
    /// a mix.
    async fn write_reference_set(
        &self,
        user_rid: Uuid,
        references: &ReferenceSet,
    ) -> Result<(), VerifyError>;

    /// Records an attempt's outcome and its computed embedding.
    ///
    /// The outcome of an attempt is written at most once; a second write
    /// for the same attempt is a storage error.
    async fn write_attempt_outcome(
        &self,
        attempt_rid: Uuid,
        identified: bool,
        embedding: &Embedding,
    ) -> Result<(), VerifyError>;
}

impl fmt::Debug for dyn VerifyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyStore {{ ... }}")
    }
}

/// In-memory [`VerifyStore`]. Rows are lost on restart; suitable for
/// tests and ephemeral deployments.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    attempts: Vec<Attempt>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner {
                users: HashMap::new(),
                attempts: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Creates a user row with raw enrollment recordings and no
    /// references. Returns the internal id.
    pub fn insert_user(&self, rid: Uuid, recordings: [Option<Vec<u8>>; REFERENCE_SLOTS]) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.users.insert(
            rid,
            User {
                id,
                rid,
                recordings,
                references: ReferenceSet::empty(),
                updated_at: None,
            },
        );
        id
    }

    /// Creates an attempt row with its raw recording. Returns the
    /// attempt rid.
    pub fn insert_attempt(
        &self,
        user_rid: Uuid,
        recording: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        let rid = Uuid::new_v4();
        inner.attempts.push(Attempt {
            id,
            rid,
            user_rid,
            recording,
            identified: None,
            embedding: Embedding::empty(),
            created_at,
            updated_at: None,
        });
        rid
    }

    /// Returns a copy of a user row, if present.
    pub fn user(&self, rid: Uuid) -> Option<User> {
        self.inner.lock().unwrap().users.get(&rid).cloned()
    }

    /// Returns a copy of an attempt row, if present.
    pub fn attempt(&self, rid: Uuid) -> Option<Attempt> {
        self.inner
            .lock()
            .unwrap()
            .attempts
            .iter()
            .find(|a| a.rid == rid)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerifyStore for MemoryStore {
    async fn fetch_user(&self, rid: Uuid) -> Result<User, VerifyError> {
        self.user(rid)
            .ok_or(VerifyError::NotFound { what: "user", rid })
    }

    async fn fetch_latest_attempt(&self, user_rid: Uuid) -> Result<Attempt, VerifyError> {
        let inner = self.inner.lock().unwrap();
        inner
            .attempts
            .iter()
            .filter(|a| a.user_rid == user_rid)
            .max_by_key(|a| (a.created_at, a.id))
            .cloned()
            .ok_or(VerifyError::NotFound {
                what: "attempt",
                rid: user_rid,
            })
    }

    async fn write_reference_set(
        &self,
        user_rid: Uuid,
        references: &ReferenceSet,
    ) -> Result<(), VerifyError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&user_rid).ok_or(VerifyError::NotFound {
            what: "user",
            rid: user_rid,
        })?;
        // All three slots swap under one lock acquisition.
        user.references = references.clone();
        user.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn write_attempt_outcome(
        &self,
        attempt_rid: Uuid,
        identified: bool,
        embedding: &Embedding,
    ) -> Result<(), VerifyError> {
        let mut inner = self.inner.lock().unwrap();
        let attempt = inner
            .attempts
            .iter_mut()
            .find(|a| a.rid == attempt_rid)
            .ok_or(VerifyError::NotFound {
                what: "attempt",
                rid: attempt_rid,
            })?;
        if attempt.identified.is_some() {
            return Err(VerifyError::Storage(format!(
                "outcome already recorded for attempt {attempt_rid}"
            )));
        }
        attempt.identified = Some(identified);
        attempt.embedding = embedding.clone();
        attempt.updated_at = Some(Utc::now());
        Ok(())
    }
}
