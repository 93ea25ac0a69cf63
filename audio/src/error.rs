use std::io;

use thiserror::Error;

/// Errors returned by audio decoding.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: staging io error: {0}")]
    Io(#[from] io::Error),

    #[error("audio: decode failed: {0}")]
    Decode(String),

    #[error("audio: container has no audio track")]
    NoAudioTrack,
}
