//! Mel power spectrogram
//!
//! Parameters are pinned to what the classifier was trained against:
//! 2048-point periodic Hann window, hop 512, 128 Slaney mel bands from 0 Hz to
//! Nyquist with Slaney area normalization, power 2.0, centered frames with zero
//! padding. Changing any of these silently degrades predictions.

use ndarray::Array2;
use realfft::RealFftPlanner;

use crate::error::{ClassifyError, Result};

/// FFT window size in samples
pub const N_FFT: usize = 2048;

/// Hop between successive frames in samples
pub const HOP_LENGTH: usize = 512;

/// Number of mel bands (frequency axis)
pub const N_MELS: usize = 128;

/// Mel spectrogram of one signal.
///
/// Shape is `(N_MELS, n_frames)`; the frame count depends on signal length.
#[derive(Debug, Clone)]
pub struct MelSpectrogram {
    /// Band energies, rows = mel bands, columns = time frames
    pub bands: Array2<f32>,
    /// Sample rate the spectrogram was computed at
    pub sample_rate: u32,
}

impl MelSpectrogram {
    pub fn n_bands(&self) -> usize {
        self.bands.nrows()
    }

    pub fn n_frames(&self) -> usize {
        self.bands.ncols()
    }
}

/// Compute the mel power spectrogram of mono samples at their own rate.
pub fn compute_mel_spectrogram(samples: &[f32], sample_rate: u32) -> Result<MelSpectrogram> {
    if samples.is_empty() {
        return Err(ClassifyError::Decode("Empty input samples".to_string()));
    }
    if sample_rate == 0 {
        return Err(ClassifyError::Decode("Invalid sample rate 0".to_string()));
    }

    let power = power_spectrogram(samples)?;
    let filterbank = create_mel_filterbank(N_MELS, N_FFT, sample_rate as f64);
    let bands = filterbank.dot(&power);

    log::debug!(
        "Mel spectrogram: {} bands x {} frames at {} Hz",
        bands.nrows(),
        bands.ncols(),
        sample_rate
    );

    Ok(MelSpectrogram { bands, sample_rate })
}

/// Centered STFT power spectrogram, shape `(N_FFT / 2 + 1, n_frames)`
fn power_spectrogram(samples: &[f32]) -> Result<Array2<f32>> {
    let pad = N_FFT / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_bins = N_FFT / 2 + 1;
    let n_frames = 1 + (padded.len() - N_FFT) / HOP_LENGTH;

    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(N_FFT);
    let mut input = r2c.make_input_vec();
    let mut spectrum = r2c.make_output_vec();
    let mut scratch = r2c.make_scratch_vec();

    let window = hann_window(N_FFT);
    let mut power = Array2::<f32>::zeros((n_bins, n_frames));

    for frame_idx in 0..n_frames {
        let start = frame_idx * HOP_LENGTH;
        let frame = &padded[start..start + N_FFT];
        for ((dst, &s), &w) in input.iter_mut().zip(frame).zip(&window) {
            *dst = s * w;
        }

        r2c.process_with_scratch(&mut input, &mut spectrum, &mut scratch)
            .map_err(|e| ClassifyError::Inference(format!("FFT failed: {}", e)))?;

        for (bin, c) in spectrum.iter().enumerate() {
            power[[bin, frame_idx]] = c.re * c.re + c.im * c.im;
        }
    }

    Ok(power)
}

/// Periodic Hann window (the DFT-even variant used for spectral analysis)
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / size as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

/// Create the Slaney-normalized triangular mel filterbank.
///
/// Returns an `(n_bands, frame_size / 2 + 1)` matrix spanning 0 Hz to Nyquist.
pub fn create_mel_filterbank(n_bands: usize, frame_size: usize, sample_rate: f64) -> Array2<f32> {
    let n_bins = frame_size / 2 + 1;
    let f_max = sample_rate / 2.0;

    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|i| f_max * i as f64 / (n_bins - 1) as f64)
        .collect();

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(f_max);
    let n_points = n_bands + 2;
    let mel_f: Vec<f64> = (0..n_points)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_points - 1) as f64))
        .collect();

    let mut filterbank = Array2::<f32>::zeros((n_bands, n_bins));
    for band in 0..n_bands {
        let (left, center, right) = (mel_f[band], mel_f[band + 1], mel_f[band + 2]);
        let enorm = 2.0 / (right - left);
        for (bin, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - left) / (center - left);
            let upper = (right - freq) / (right - center);
            let weight = lower.min(upper).max(0.0);
            filterbank[[band, bin]] = (weight * enorm) as f32;
        }
    }

    filterbank
}

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}
