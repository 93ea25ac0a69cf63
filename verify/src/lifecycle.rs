//! Attempt lifecycle state machine.
//!
//! # States
//!
//! ```text
//! Created -> Decoded -> FeatureExtracted -> Scored -> Resolved{identified}
//!    |          |              |               |
//!    +----------+------+-------+---------------+
//!                      v
//!                Failed{reason}
//! ```
//!
//! Transitions are strictly sequential, one per pipeline stage, and no
//! state is skipped. `Resolved` and `Failed` are terminal.
//! A failed run leaves the attempt's `identified` flag untouched; only
//! `Resolved` triggers the single outcome write.

use uuid::Uuid;

use crate::error::{ErrorKind, VerifyError};

/// Position of an identification attempt in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Attempt row exists with its raw recording; nothing has run.
    Created,
    /// The recording blob was decoded (or recognized as absent).
    Decoded,
    /// The attempt embedding was computed.
    FeatureExtracted,
    /// The distance against the reference set was computed.
    Scored,
    /// The decision was made and persisted.
    Resolved { identified: bool },
    /// A pipeline stage failed; `identified` was never written.
    Failed { reason: ErrorKind },
}

impl AttemptState {
    /// Returns true if `next` is a legal successor of this state.
    ///
    /// Legal successors are the next sequential stage, or `Failed` from
    /// any non-terminal state.
    pub fn can_advance(&self, next: &AttemptState) -> bool {
        use AttemptState::*;
        match (self, next) {
            (Created, Decoded)
            | (Decoded, FeatureExtracted)
            | (FeatureExtracted, Scored)
            | (Scored, Resolved { .. }) => true,
            (Created | Decoded | FeatureExtracted | Scored, Failed { .. }) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Resolved { .. } | AttemptState::Failed { .. })
    }
}

/// Tracks one attempt's progression through the pipeline stages.
pub(crate) struct Lifecycle {
    rid: Uuid,
    state: AttemptState,
}

impl Lifecycle {
    pub(crate) fn new(rid: Uuid) -> Self {
        Self {
            rid,
            state: AttemptState::Created,
        }
    }

    pub(crate) fn state(&self) -> AttemptState {
        self.state
    }

    /// Moves to the next sequential state.
    pub(crate) fn advance(&mut self, next: AttemptState) {
        debug_assert!(
            self.state.can_advance(&next),
            "illegal attempt transition {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(attempt = %self.rid, from = ?self.state, to = ?next, "attempt state");
        self.state = next;
    }

    /// Moves to `Failed` and hands the error back for propagation.
    pub(crate) fn fail(&mut self, err: VerifyError) -> VerifyError {
        let reason = err.kind();
        tracing::warn!(attempt = %self.rid, kind = ?reason, error = %err, "verification failed");
        self.state = AttemptState::Failed { reason };
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQUENCE: [AttemptState; 4] = [
        AttemptState::Created,
        AttemptState::Decoded,
        AttemptState::FeatureExtracted,
        AttemptState::Scored,
    ];

    #[test]
    fn sequential_transitions_are_legal() {
        for pair in SEQUENCE.windows(2) {
            assert!(pair[0].can_advance(&pair[1]), "{pair:?}");
        }
        assert!(AttemptState::Scored.can_advance(&AttemptState::Resolved { identified: true }));
    }

    #[test]
    fn skipping_a_stage_is_illegal() {
        assert!(!AttemptState::Created.can_advance(&AttemptState::FeatureExtracted));
        assert!(!AttemptState::Created.can_advance(&AttemptState::Scored));
        assert!(!AttemptState::Decoded.can_advance(&AttemptState::Resolved { identified: false }));
        assert!(!AttemptState::FeatureExtracted
            .can_advance(&AttemptState::Resolved { identified: true }));
    }

    #[test]
    fn going_backwards_is_illegal() {
        assert!(!AttemptState::Scored.can_advance(&AttemptState::Decoded));
        assert!(!AttemptState::Decoded.can_advance(&AttemptState::Created));
    }

    #[test]
    fn any_live_state_can_fail() {
        let failed = AttemptState::Failed {
            reason: ErrorKind::Decode,
        };
        for state in SEQUENCE {
            assert!(state.can_advance(&failed), "{state:?}");
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        let resolved = AttemptState::Resolved { identified: true };
        let failed = AttemptState::Failed {
            reason: ErrorKind::Storage,
        };
        for terminal in [resolved, failed] {
            assert!(terminal.is_terminal());
            for next in SEQUENCE {
                assert!(!terminal.can_advance(&next));
            }
            assert!(!terminal.can_advance(&failed));
            assert!(!terminal.can_advance(&resolved));
        }
    }

    #[test]
    fn lifecycle_tracks_failure_reason() {
        let mut lc = Lifecycle::new(Uuid::nil());
        lc.advance(AttemptState::Decoded);
        let err = lc.fail(VerifyError::NoUsableAudio);
        assert_eq!(err.kind(), ErrorKind::NoUsableAudio);
        assert_eq!(
            lc.state(),
            AttemptState::Failed {
                reason: ErrorKind::NoUsableAudio
            }
        );
    }
}
