//! Decode a recorded-audio blob into PCM samples.

use std::fs::File;
use std::io::Write;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tempfile::NamedTempFile;

use crate::AudioError;

/// Decoded mono audio at the container's native sample rate.
///
/// No resampling happens at decode time; `sample_rate` is whatever the
/// container reports. Multi-channel input is folded to mono by averaging
/// the channels of each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    /// Returns true if the waveform carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Staged copy of a blob on disk, removed on drop.
///
/// Each decode call gets its own uniquely named file, so concurrent calls
/// never observe each other's staging state and an abandoned call still
/// cleans up when the guard is dropped.
struct Staging {
    file: NamedTempFile,
}

impl Staging {
    fn write(blob: &[u8]) -> Result<Self, AudioError> {
        let mut file = tempfile::Builder::new()
            .prefix("voxgate-blob-")
            .tempfile()?;
        file.write_all(blob)?;
        file.flush()?;
        Ok(Self { file })
    }

    fn open(&self) -> Result<File, AudioError> {
        Ok(self.file.reopen()?)
    }
}

/// Decodes an opaque recorded-audio blob into a mono [`Waveform`].
///
/// Returns `Ok(None)` for an empty blob: "no recording yet" is a valid
/// state, distinct from a blob that fails to parse (`AudioError::Decode`)
/// and from a well-formed container with no audio payload (also a decode
/// error, never an empty waveform).
pub fn decode(blob: &[u8]) -> Result<Option<Waveform>, AudioError> {
    if blob.is_empty() {
        return Ok(None);
    }

    // Staging file lives for the duration of this call only.
    let staging = Staging::write(blob)?;
    let source = staging.open()?;

    let mss = MediaSourceStream::new(Box::new(source), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format.default_track().ok_or(AudioError::NoAudioTrack)?;
        (track.id, track.codec_params.clone())
    };

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("sample rate not reported".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped; the stream may still recover.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();

        if sample_buf
            .as_ref()
            .map(|b| b.capacity() < decoded.capacity())
            .unwrap_or(true)
        {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let buf = match sample_buf.as_mut() {
            Some(buf) => buf,
            None => continue,
        };

        buf.copy_interleaved_ref(decoded);
        fold_to_mono(buf.samples(), channels, &mut samples);
    }

    if samples.is_empty() {
        // A container that parses but yields no PCM is bad data, not "no
        // recording"; the empty blob case was handled above.
        return Err(AudioError::Decode("no audio packets in container".into()));
    }

    Ok(Some(Waveform {
        samples,
        sample_rate,
    }))
}

/// Averages interleaved channels into mono samples.
fn fold_to_mono(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks_exact(channels) {
        let mut acc: f64 = 0.0;
        for &s in frame {
            acc += s as f64;
        }
        out.push((acc / channels as f64) as f32);
    }
}
