use thiserror::Error;
use uuid::Uuid;
use voxgate_audio::AudioError;
use voxgate_mfcc::MfccError;

/// Failure class of a [`VerifyError`].
///
/// Callers branch on the kind, never on message text. In particular,
/// "could not verify" kinds (`Decode`, `NoUsableAudio`,
/// `InsufficientEnrollment`) are distinct from a completed negative
/// match, which is not an error at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    NoUsableAudio,
    InsufficientEnrollment,
    NotFound,
    Storage,
    Dimension,
}

/// Errors returned by the verification pipeline.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The recording blob could not be decoded.
    #[error("verify: {0}")]
    Decode(#[from] AudioError),

    /// The attempt recording decoded to no usable audio (absent or
    /// silence-only).
    #[error("verify: attempt recording has no usable audio")]
    NoUsableAudio,

    /// No reference slot holds a usable embedding.
    #[error("verify: no usable reference embeddings enrolled")]
    InsufficientEnrollment,

    /// A user or attempt row does not exist.
    #[error("verify: {what} not found: {rid}")]
    NotFound { what: &'static str, rid: Uuid },

    /// The storage collaborator failed; never retried by the core.
    #[error("verify: storage error: {0}")]
    Storage(String),

    /// A stored or computed vector has the wrong dimensionality.
    #[error("verify: {0}")]
    Dimension(#[from] MfccError),
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::NoUsableAudio => ErrorKind::NoUsableAudio,
            Self::InsufficientEnrollment => ErrorKind::InsufficientEnrollment,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Dimension(_) => ErrorKind::Dimension,
        }
    }
}
