use thiserror::Error;

/// Errors returned by embedding construction.
#[derive(Debug, Error)]
pub enum MfccError {
    #[error("mfcc: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
