//! Recorded-audio blob handling: container decoding and silence trimming.
//!
//! # Architecture
//!
//! The pipeline entry point for raw audio is two stages:
//!
//! 1. [`decode`]: opaque byte blob -> mono [`Waveform`] at the container's
//!    native sample rate
//! 2. [`trim`]: waveform -> waveform with leading/trailing near-silence
//!    removed
//!
//! Demuxing and codec work is delegated to symphonia. Because the demuxer
//! wants a seekable source, each decode stages the blob into a uniquely
//! named temporary file that is removed when the call returns, on success
//! and failure alike.
//!
//! An absent recording (empty blob) is not an error: [`decode`] returns
//! `Ok(None)` so that callers can tell "no recording yet" apart from a
//! recording that failed to parse.

mod decode;
mod error;
mod trim;

pub use decode::{decode, Waveform};
pub use error::AudioError;
pub use trim::{trim, TrimConfig};
