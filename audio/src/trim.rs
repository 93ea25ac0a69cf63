//! Leading/trailing silence removal.

use crate::Waveform;

/// Configures silence trimming.
///
/// The threshold is fixed configuration, never derived per call: a frame
/// is silent when its RMS energy is more than `top_db` below the loudest
/// frame of the same waveform.
#[derive(Debug, Clone, Copy)]
pub struct TrimConfig {
    /// Threshold below the peak frame, in decibels (default: 60.0).
    pub top_db: f32,
    /// Analysis frame length in samples (default: 2048).
    pub frame_length: usize,
    /// Hop between frame starts in samples (default: 512).
    pub hop_length: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            top_db: 60.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// Removes leading and trailing near-silence from a waveform.
///
/// An entirely silent (or empty) input yields a zero-length waveform with
/// the sample rate preserved, never an error; downstream feature
/// extraction treats the zero-length case as "no usable audio".
pub fn trim(waveform: &Waveform, cfg: &TrimConfig) -> Waveform {
    let n = waveform.samples.len();
    if n == 0 || cfg.frame_length == 0 || cfg.hop_length == 0 {
        return waveform.clone();
    }

    // Frame RMS, including a final partial frame so a burst in the tail
    // is not dropped.
    let mut rms = Vec::new();
    let mut start = 0;
    while start < n {
        let end = (start + cfg.frame_length).min(n);
        let mut acc: f64 = 0.0;
        for &s in &waveform.samples[start..end] {
            acc += (s as f64) * (s as f64);
        }
        rms.push((acc / (end - start) as f64).sqrt());
        start += cfg.hop_length;
    }

    let peak = rms.iter().cloned().fold(0.0f64, f64::max);
    if peak <= 0.0 {
        return Waveform {
            samples: Vec::new(),
            sample_rate: waveform.sample_rate,
        };
    }

    let threshold = peak * 10f64.powf(-(cfg.top_db as f64) / 20.0);
    let first = rms.iter().position(|&r| r > threshold);
    let last = rms.iter().rposition(|&r| r > threshold);

    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return Waveform {
                samples: Vec::new(),
                sample_rate: waveform.sample_rate,
            }
        }
    };

    let lo = first * cfg.hop_length;
    let hi = (last * cfg.hop_length + cfg.frame_length).min(n);

    Waveform {
        samples: waveform.samples[lo..hi].to_vec(),
        sample_rate: waveform.sample_rate,
    }
}
