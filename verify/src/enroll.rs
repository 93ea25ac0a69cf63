//! Reference aggregation: building a user's reference set from their
//! enrollment recordings.

use tracing::warn;
use voxgate_audio::{decode, trim};
use voxgate_mfcc::{extract, Embedding};

use crate::config::VerifyConfig;
use crate::error::VerifyError;
use crate::types::{ReferenceSet, REFERENCE_SLOTS};

/// A failure confined to one enrollment slot.
///
/// `slot` is 1-based, matching the positional storage columns.
#[derive(Debug)]
pub struct SlotError {
    pub slot: usize,
    pub error: VerifyError,
}

/// Runs decode -> trim -> extract over each enrollment recording
/// independently and collects the results positionally.
///
/// A failure in one slot never aborts the others: the failed slot stays
/// empty and the failure is reported in the error list. A missing
/// recording, or one that decodes to pure silence, yields the empty
/// embedding with no error; absence is valid partial enrollment, not a
/// fault.
pub fn build_reference_set(
    recordings: &[Option<Vec<u8>>; REFERENCE_SLOTS],
    config: &VerifyConfig,
) -> (ReferenceSet, Vec<SlotError>) {
    let mut slots: [Embedding; REFERENCE_SLOTS] = Default::default();
    let mut errors = Vec::new();

    for (i, recording) in recordings.iter().enumerate() {
        let blob = match recording {
            Some(blob) => blob.as_slice(),
            None => continue,
        };
        match embed_blob(blob, config) {
            Ok(embedding) => slots[i] = embedding,
            Err(error) => {
                warn!(slot = i + 1, error = %error, "reference recording unusable");
                errors.push(SlotError {
                    slot: i + 1,
                    error,
                });
            }
        }
    }

    (ReferenceSet::new(slots), errors)
}

/// Decodes, trims, and extracts one recording blob.
///
/// An absent blob maps to the empty embedding; decode failures
/// propagate.
fn embed_blob(blob: &[u8], config: &VerifyConfig) -> Result<Embedding, VerifyError> {
    let waveform = match decode(blob)? {
        Some(waveform) => waveform,
        None => return Ok(Embedding::empty()),
    };
    let trimmed = trim(&waveform, &config.trim);
    Ok(extract(&trimmed.samples, trimmed.sample_rate, &config.mfcc))
}
