use std::f64::consts::PI;

use crate::embedding::{Embedding, EMBEDDING_DIM};

/// Configures MFCC extraction.
///
/// Defaults match the analysis the verification pipeline was calibrated
/// against: 2048-sample Hann windows every 512 samples, 128 mel bins over
/// the full band, 40 cepstral coefficients.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// Analysis window length in samples (default: 2048).
    pub n_fft: usize,
    /// Hop between window starts in samples (default: 512).
    pub hop_length: usize,
    /// Number of mel filterbank channels; must be at least
    /// [`EMBEDDING_DIM`] (default: 128).
    pub n_mels: usize,
    /// Low cutoff frequency for mel bins in Hz (default: 0).
    pub low_freq: f64,
    /// High cutoff frequency in Hz; zero or negative means Nyquist
    /// (default: 0).
    pub high_freq: f64,
    /// Floor for mel energies before the log (default: 1e-10).
    pub energy_floor: f64,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            low_freq: 0.0,
            high_freq: 0.0,
            energy_floor: 1e-10,
        }
    }
}

/// Computes the time-averaged MFCC embedding of a mono waveform.
///
/// Unusable input (no samples, zero sample rate, or a degenerate config)
/// yields the empty [`Embedding`]; this function never fails. A signal
/// shorter than one analysis window is zero-padded to a single frame.
///
/// Deterministic: identical input produces bit-identical output.
pub fn extract(samples: &[f32], sample_rate: u32, cfg: &MfccConfig) -> Embedding {
    if samples.is_empty()
        || sample_rate == 0
        || cfg.n_fft == 0
        || cfg.hop_length == 0
        || cfg.n_mels < EMBEDDING_DIM
    {
        return Embedding::empty();
    }

    let mut signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    if signal.len() < cfg.n_fft {
        signal.resize(cfg.n_fft, 0.0);
    }

    let num_frames = (signal.len() - cfg.n_fft) / cfg.hop_length + 1;

    // FFT size: next power of 2 >= window length; the frame is zero-padded
    // into the FFT buffer.
    let fft_size = next_pow2(cfg.n_fft);
    let half_fft = fft_size / 2 + 1;

    let window = hann_window(cfg.n_fft);

    let high_freq = if cfg.high_freq <= 0.0 {
        sample_rate as f64 / 2.0
    } else {
        cfg.high_freq
    };
    let filterbank = mel_filterbank(cfg.n_mels, fft_size, sample_rate, cfg.low_freq, high_freq);
    let dct = DctII::new(cfg.n_mels, EMBEDDING_DIM);

    let mut mean = vec![0.0f64; EMBEDDING_DIM];
    let mut fft_buf = vec![(0.0f64, 0.0f64); fft_size];
    let mut power_spec = vec![0.0f64; half_fft];
    let mut log_mel = vec![0.0f64; cfg.n_mels];

    for f in 0..num_frames {
        let offset = f * cfg.hop_length;

        for v in &mut fft_buf {
            *v = (0.0, 0.0);
        }
        for i in 0..cfg.n_fft {
            fft_buf[i] = (signal[offset + i] * window[i], 0.0);
        }

        fft(&mut fft_buf);

        for k in 0..half_fft {
            let (re, im) = fft_buf[k];
            power_spec[k] = re * re + im * im;
        }

        for m in 0..cfg.n_mels {
            let mut energy: f64 = 0.0;
            for (k, &w) in filterbank[m].iter().enumerate() {
                energy += w * power_spec[k];
            }
            if energy < cfg.energy_floor {
                energy = cfg.energy_floor;
            }
            log_mel[m] = energy.ln();
        }

        dct.accumulate(&log_mel, &mut mean);
    }

    let n = num_frames as f64;
    let coeffs: Vec<f32> = mean.iter().map(|&c| (c / n) as f32).collect();
    Embedding::from_raw(coeffs)
}

/// Orthonormal DCT-II with precomputed basis.
struct DctII {
    n_input: usize,
    basis: Vec<Vec<f64>>,
}

impl DctII {
    fn new(n_input: usize, n_output: usize) -> Self {
        let scale0 = (1.0 / n_input as f64).sqrt();
        let scale = (2.0 / n_input as f64).sqrt();
        let mut basis = Vec::with_capacity(n_output);
        for k in 0..n_output {
            let s = if k == 0 { scale0 } else { scale };
            basis.push(
                (0..n_input)
                    .map(|m| s * (PI / n_input as f64 * (m as f64 + 0.5) * k as f64).cos())
                    .collect(),
            );
        }
        Self { n_input, basis }
    }

    /// Adds the DCT of `input` onto `acc`, coefficient by coefficient.
    fn accumulate(&self, input: &[f64], acc: &mut [f64]) {
        debug_assert_eq!(input.len(), self.n_input);
        for (k, row) in self.basis.iter().enumerate() {
            let mut c: f64 = 0.0;
            for (m, &b) in row.iter().enumerate() {
                c += input[m] * b;
            }
            acc[k] += c;
        }
    }
}

fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Periodic Hann window.
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Computes triangular mel filterbank weights.
/// Returns `[n_mels][half_fft]` weights.
fn mel_filterbank(
    n_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    // Equally spaced mel points.
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_low + i as f64 * (mel_high - mel_low) / (n_mels + 1) as f64)
        .collect();

    // Convert back to Hz and then to FFT bin indices.
    let bin_indices: Vec<usize> = mel_points
        .iter()
        .map(|&m| {
            let hz = mel_to_hz(m);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.max(0).min(half_fft as isize - 1) as usize
        })
        .collect();

    // Build triangular filters.
    let mut fb = Vec::with_capacity(n_mels);
    for m in 0..n_mels {
        let mut filter = vec![0.0f64; half_fft];
        let left = bin_indices[m];
        let center = bin_indices[m + 1];
        let right = bin_indices[m + 2];

        // Rising slope.
        if center > left {
            for k in left..=center {
                filter[k] = (k - left) as f64 / (center - left) as f64;
            }
        }
        // Falling slope.
        if right > center {
            for k in center..=right {
                filter[k] = (right - k) as f64 / (right - center) as f64;
            }
        }
        fb.push(filter);
    }
    fb
}

/// In-place Cooley-Tukey FFT.
/// Input length must be a power of 2.
/// Uses (real, imag) tuples instead of a complex number type.
fn fft(x: &mut [(f64, f64)]) {
    let n = x.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    // Butterfly operations.
    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let angle = -2.0 * PI / size as f64;
        let wn = (angle.cos(), angle.sin());
        let mut start = 0;
        while start < n {
            let mut w = (1.0, 0.0);
            for k in 0..half {
                let u = x[start + k];
                let t_re = w.0 * x[start + k + half].0 - w.1 * x[start + k + half].1;
                let t_im = w.0 * x[start + k + half].1 + w.1 * x[start + k + half].0;
                x[start + k] = (u.0 + t_re, u.1 + t_im);
                x[start + k + half] = (u.0 - t_re, u.1 - t_im);
                let new_w_re = w.0 * wn.0 - w.1 * wn.1;
                let new_w_im = w.0 * wn.1 + w.1 * wn.0;
                w = (new_w_re, new_w_im);
            }
            start += size;
        }
        size <<= 1;
    }
}
