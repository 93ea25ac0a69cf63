//! Distance scoring and the threshold decision.

use voxgate_mfcc::Embedding;

use crate::error::VerifyError;
use crate::types::ReferenceSet;

/// Vector distance metric used for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Euclidean (L2) distance.
    #[default]
    Euclidean,
    /// Negated inner product: smaller means more similar, so the same
    /// less-than threshold rule applies.
    InnerProduct,
}

/// Scores an attempt embedding against the enrolled reference set.
///
/// The score is the arithmetic mean of the per-slot distances over the
/// non-empty reference slots. Failure classes are distinct and must stay
/// so: an empty attempt embedding is [`VerifyError::NoUsableAudio`], an
/// entirely empty reference set is
/// [`VerifyError::InsufficientEnrollment`]. Neither is ever reported as
/// a negative match.
pub fn score(
    attempt: &Embedding,
    references: &ReferenceSet,
    metric: Metric,
) -> Result<f32, VerifyError> {
    if attempt.is_empty() {
        return Err(VerifyError::NoUsableAudio);
    }

    let mut acc: f64 = 0.0;
    let mut count: usize = 0;
    for reference in references.available() {
        acc += pair_distance(attempt.as_slice(), reference.as_slice(), metric);
        count += 1;
    }

    if count == 0 {
        return Err(VerifyError::InsufficientEnrollment);
    }

    Ok((acc / count as f64) as f32)
}

/// Converts a distance score into the identified/rejected outcome.
///
/// Strict less-than: a distance exactly at the threshold is NOT
/// identified.
pub fn decide(distance: f32, threshold: f32) -> bool {
    distance < threshold
}

fn pair_distance(a: &[f32], b: &[f32], metric: Metric) -> f64 {
    match metric {
        Metric::Euclidean => euclidean(a, b),
        Metric::InnerProduct => -dot(a, b),
    }
}

/// Euclidean distance with f64 accumulation.
fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    let mut acc: f64 = 0.0;
    for i in 0..a.len() {
        let d = a[i] as f64 - b[i] as f64;
        acc += d * d;
    }
    acc.sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    let mut acc: f64 = 0.0;
    for i in 0..a.len() {
        acc += (a[i] as f64) * (b[i] as f64);
    }
    acc
}
