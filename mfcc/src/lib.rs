//! Fixed-dimensionality MFCC speaker embeddings.
//!
//! # Architecture
//!
//! [`extract`] maps a mono waveform to a single [`Embedding`]:
//!
//! 1. Short-time analysis: Hann-windowed frames of `n_fft` samples every
//!    `hop_length` samples
//! 2. Power spectrum per frame via radix-2 FFT
//! 3. Triangular mel filterbank, log energies with a floor
//! 4. DCT-II (orthonormal) to `EMBEDDING_DIM` cepstral coefficients
//! 5. Arithmetic mean over frames, collapsing the time axis
//!
//! The output dimensionality ([`EMBEDDING_DIM`] = 40) is a fixed contract:
//! storage columns and distance computation both rely on it, so changing
//! it is a breaking schema change.
//!
//! Unusable input (no samples, or a zero sample rate) yields the explicit
//! empty [`Embedding`], never an error and never a zero vector, so that
//! "no usable audio" stays distinguishable from a real point in feature
//! space.
//!
//! Extraction is deterministic: identical samples and sample rate produce
//! bit-identical embeddings. All accumulation runs in f64.

mod embedding;
mod error;
mod mfcc;

pub use embedding::{Embedding, EMBEDDING_DIM};
pub use error::MfccError;
pub use mfcc::{extract, MfccConfig};
