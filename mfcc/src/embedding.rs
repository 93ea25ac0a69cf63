use serde::{Deserialize, Serialize};

use crate::MfccError;

/// Number of cepstral coefficients in an embedding.
///
/// Storage schemas and distance computation depend on this value.
pub const EMBEDDING_DIM: usize = 40;

/// A fixed-length acoustic fingerprint, or the explicit empty value.
///
/// An `Embedding` holds exactly [`EMBEDDING_DIM`] coefficients, or zero
/// coefficients meaning "no usable audio". No other length exists:
/// construction from a wrong-sized vector fails with
/// [`MfccError::DimensionMismatch`] instead of padding, truncating, or
/// substituting zeros (a zero vector is a legitimate point in feature
/// space, not a missing-data marker).
///
/// Serializes as a plain numeric array (`[]` for the empty value), and
/// deserialization applies the same length check, so malformed stored
/// vectors surface as errors rather than biased distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// The explicit "no usable audio" value.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds an embedding from a vector of length 0 or [`EMBEDDING_DIM`].
    pub fn from_vec(values: Vec<f32>) -> Result<Self, MfccError> {
        if values.is_empty() || values.len() == EMBEDDING_DIM {
            Ok(Self(values))
        } else {
            Err(MfccError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                got: values.len(),
            })
        }
    }

    /// Internal constructor for vectors whose length is already known
    /// to be [`EMBEDDING_DIM`].
    pub(crate) fn from_raw(values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), EMBEDDING_DIM);
        Self(values)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Default for Embedding {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = MfccError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::from_vec(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(e: Embedding) -> Self {
        e.0
    }
}
