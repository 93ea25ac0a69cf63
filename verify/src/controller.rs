//! Orchestration of enrollment and identification.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;
use voxgate_audio::{decode, trim};
use voxgate_mfcc::{extract, Embedding};

use crate::config::VerifyConfig;
use crate::enroll::{build_reference_set, SlotError};
use crate::error::VerifyError;
use crate::lifecycle::{AttemptState, Lifecycle};
use crate::matcher::{decide, score};
use crate::store::VerifyStore;

/// Result of an enrollment run.
///
/// Enrollment has no failed terminal state: per-slot failures are
/// reported here while the remaining slots are still persisted.
#[derive(Debug)]
pub struct Enrollment {
    pub slot_errors: Vec<SlotError>,
}

/// Result of a completed identification run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identification {
    pub attempt_rid: Uuid,
    pub distance: f32,
    pub identified: bool,
}

/// Drives the enrollment and identification pipelines over a storage
/// collaborator.
///
/// The controller is stateless between calls; every invocation works on
/// its own row snapshots, so concurrent calls for the same user never
/// share or clobber intermediate state.
pub struct VerificationController {
    store: Arc<dyn VerifyStore>,
    config: VerifyConfig,
}

impl VerificationController {
    pub fn new(store: Arc<dyn VerifyStore>, config: VerifyConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Processes a user's enrollment recordings into their reference set.
    ///
    /// Builds embeddings per slot (failures isolated per slot), then
    /// persists the whole triple in one atomic write. Storage and
    /// user-lookup failures are the only fatal outcomes.
    pub async fn enroll(&self, user_rid: Uuid) -> Result<Enrollment, VerifyError> {
        let user = self.store.fetch_user(user_rid).await?;

        let (references, slot_errors) = build_reference_set(&user.recordings, &self.config);
        self.store
            .write_reference_set(user_rid, &references)
            .await?;

        debug!(
            user = %user_rid,
            available = references.available_count(),
            failed_slots = slot_errors.len(),
            "enrollment complete"
        );
        Ok(Enrollment { slot_errors })
    }

    /// Verifies a user's most recent identification attempt.
    ///
    /// Runs the attempt lifecycle strictly in order: decode, extract,
    /// score, decide, persist. Any stage failure moves the attempt to
    /// its failed state and leaves the stored `identified` flag
    /// untouched; only a resolved attempt is written back, exactly once,
    /// keyed by the attempt rid captured in this call's snapshot.
    pub async fn identify(&self, user_rid: Uuid) -> Result<Identification, VerifyError> {
        let user = self.store.fetch_user(user_rid).await?;
        let attempt = self.store.fetch_latest_attempt(user_rid).await?;

        let mut lifecycle = Lifecycle::new(attempt.rid);

        let waveform = match decode(&attempt.recording) {
            Ok(waveform) => waveform,
            Err(e) => return Err(lifecycle.fail(e.into())),
        };
        lifecycle.advance(AttemptState::Decoded);

        let embedding = match waveform {
            Some(waveform) => {
                let trimmed = trim(&waveform, &self.config.trim);
                extract(&trimmed.samples, trimmed.sample_rate, &self.config.mfcc)
            }
            None => Embedding::empty(),
        };
        lifecycle.advance(AttemptState::FeatureExtracted);

        let distance = match score(&embedding, &user.references, self.config.metric) {
            Ok(distance) => distance,
            Err(e) => return Err(lifecycle.fail(e)),
        };
        lifecycle.advance(AttemptState::Scored);

        let identified = decide(distance, self.config.threshold);
        if let Err(e) = self
            .store
            .write_attempt_outcome(attempt.rid, identified, &embedding)
            .await
        {
            return Err(lifecycle.fail(e));
        }
        lifecycle.advance(AttemptState::Resolved { identified });

        Ok(Identification {
            attempt_rid: attempt.rid,
            distance,
            identified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use std::f64::consts::PI;

    fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + samples.len() * 2);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    fn tone_wav(freq: f64, n: usize, sample_rate: u32) -> Vec<u8> {
        let samples: Vec<i16> = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (0.5 * (freq * 2.0 * PI * t).sin() * 32767.0) as i16
            })
            .collect();
        wav_bytes(&samples, sample_rate)
    }

    fn silent_wav(n: usize, sample_rate: u32) -> Vec<u8> {
        wav_bytes(&vec![0i16; n], sample_rate)
    }

    fn controller(store: Arc<MemoryStore>) -> VerificationController {
        VerificationController::new(store, VerifyConfig::default())
    }

    #[tokio::test]
    async fn same_voice_is_identified() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice.clone())],
        );

        let ctrl = controller(store.clone());
        let enrollment = ctrl.enroll(user_rid).await.unwrap();
        assert!(enrollment.slot_errors.is_empty());

        // Identical recording at login: aggregate distance is exactly 0.
        store.insert_attempt(user_rid, voice, Utc::now());
        let result = ctrl.identify(user_rid).await.unwrap();
        assert_eq!(result.distance, 0.0);
        assert!(result.identified);

        let attempt = store.attempt(result.attempt_rid).unwrap();
        assert_eq!(attempt.identified, Some(true));
        assert!(!attempt.embedding.is_empty(), "embedding stored for audit");
    }

    #[tokio::test]
    async fn enrollment_reports_corrupt_slot_and_keeps_the_rest() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [
                Some(voice.clone()),
                Some(vec![0xFF, 0xFE, 0x00, 0x01]),
                Some(voice),
            ],
        );

        let ctrl = controller(store.clone());
        let enrollment = ctrl.enroll(user_rid).await.unwrap();
        assert_eq!(enrollment.slot_errors.len(), 1);
        assert_eq!(enrollment.slot_errors[0].slot, 2);
        assert_eq!(enrollment.slot_errors[0].error.kind(), ErrorKind::Decode);

        let user = store.user(user_rid).unwrap();
        assert_eq!(user.references.available_count(), 2);
    }

    #[tokio::test]
    async fn silent_enrollment_fails_identification_cleanly() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let silent = silent_wav(16000, 16000);
        store.insert_user(
            user_rid,
            [Some(silent.clone()), Some(silent.clone()), Some(silent)],
        );

        let ctrl = controller(store.clone());
        let enrollment = ctrl.enroll(user_rid).await.unwrap();
        assert!(enrollment.slot_errors.is_empty());
        assert!(store.user(user_rid).unwrap().references.is_fully_empty());

        let attempt_rid =
            store.insert_attempt(user_rid, tone_wav(440.0, 16000, 16000), Utc::now());
        let err = ctrl.identify(user_rid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientEnrollment);

        // The attempt was never resolved.
        assert_eq!(store.attempt(attempt_rid).unwrap().identified, None);
    }

    #[tokio::test]
    async fn silent_attempt_is_no_usable_audio_not_a_rejection() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice)],
        );

        let ctrl = controller(store.clone());
        ctrl.enroll(user_rid).await.unwrap();

        let attempt_rid = store.insert_attempt(user_rid, silent_wav(16000, 16000), Utc::now());
        let err = ctrl.identify(user_rid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoUsableAudio);
        assert_eq!(store.attempt(attempt_rid).unwrap().identified, None);
    }

    #[tokio::test]
    async fn absent_attempt_recording_is_no_usable_audio() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice)],
        );

        let ctrl = controller(store.clone());
        ctrl.enroll(user_rid).await.unwrap();

        let attempt_rid = store.insert_attempt(user_rid, Vec::new(), Utc::now());
        let err = ctrl.identify(user_rid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoUsableAudio);
        assert_eq!(store.attempt(attempt_rid).unwrap().identified, None);
    }

    #[tokio::test]
    async fn corrupt_attempt_recording_is_decode_failure() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice)],
        );

        let ctrl = controller(store.clone());
        ctrl.enroll(user_rid).await.unwrap();

        let attempt_rid =
            store.insert_attempt(user_rid, vec![0x00, 0x01, 0x02, 0x03], Utc::now());
        let err = ctrl.identify(user_rid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(store.attempt(attempt_rid).unwrap().identified, None);
    }

    #[tokio::test]
    async fn identify_without_attempt_row_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        store.insert_user(user_rid, [None, None, None]);

        let ctrl = controller(store);
        let err = ctrl.identify(user_rid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let ctrl = controller(store);

        let err = ctrl.enroll(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ctrl.identify(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn different_voice_scores_worse_than_same_voice() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice.clone())],
        );

        let ctrl = controller(store.clone());
        ctrl.enroll(user_rid).await.unwrap();

        store.insert_attempt(user_rid, voice, Utc::now());
        let same = ctrl.identify(user_rid).await.unwrap();

        store.insert_attempt(
            user_rid,
            tone_wav(1760.0, 16000, 16000),
            Utc::now() + Duration::seconds(1),
        );
        let other = ctrl.identify(user_rid).await.unwrap();

        assert!(
            other.distance > same.distance,
            "other voice {} should score farther than same voice {}",
            other.distance,
            same.distance
        );
    }

    #[tokio::test]
    async fn attempts_resolve_independently() {
        let store = Arc::new(MemoryStore::new());
        let user_rid = Uuid::new_v4();
        let voice = tone_wav(440.0, 16000, 16000);
        store.insert_user(
            user_rid,
            [Some(voice.clone()), Some(voice.clone()), Some(voice.clone())],
        );

        let ctrl = controller(store.clone());
        ctrl.enroll(user_rid).await.unwrap();

        // First call snapshots attempt A as latest and resolves it.
        let t0 = Utc::now();
        store.insert_attempt(user_rid, voice.clone(), t0);
        let first = ctrl.identify(user_rid).await.unwrap();

        // A newer attempt B arrives; the second call resolves B, keyed by
        // its own rid, without touching A's outcome.
        store.insert_attempt(
            user_rid,
            tone_wav(1760.0, 16000, 16000),
            t0 + Duration::seconds(1),
        );
        let second = ctrl.identify(user_rid).await.unwrap();

        assert_ne!(first.attempt_rid, second.attempt_rid);
        let a = store.attempt(first.attempt_rid).unwrap();
        let b = store.attempt(second.attempt_rid).unwrap();
        assert_eq!(a.identified, Some(first.identified));
        assert_eq!(b.identified, Some(second.identified));
    }

    #[tokio::test]
    async fn concurrent_users_do_not_interfere() {
        let store = Arc::new(MemoryStore::new());
        let ctrl = Arc::new(controller(store.clone()));

        let mut rids = Vec::new();
        for freq in [330.0, 440.0] {
            let rid = Uuid::new_v4();
            let voice = tone_wav(freq, 16000, 16000);
            store.insert_user(
                rid,
                [Some(voice.clone()), Some(voice.clone()), Some(voice.clone())],
            );
            store.insert_attempt(rid, voice, Utc::now());
            rids.push(rid);
        }

        let c1 = ctrl.clone();
        let c2 = ctrl.clone();
        let (rid1, rid2) = (rids[0], rids[1]);
        let (e1, e2) = tokio::join!(c1.enroll(rid1), c2.enroll(rid2));
        e1.unwrap();
        e2.unwrap();

        let (r1, r2) = tokio::join!(c1.identify(rid1), c2.identify(rid2));
        let r1 = r1.unwrap();
        let r2 = r2.unwrap();
        assert!(r1.identified);
        assert!(r2.identified);
        assert_ne!(r1.attempt_rid, r2.attempt_rid);
    }
}
