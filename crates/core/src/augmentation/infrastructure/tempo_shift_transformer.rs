use rand::RngCore;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::shared::error::AugmentError;

/// Tempo ratio that leaves the signal untouched.
pub const DEFAULT_TEMPO_RATIO: f64 = 1.0;

/// STFT analysis/synthesis window size.
const WINDOW_SIZE: usize = 2048;

/// Hop size between successive STFT frames.
const HOP_SIZE: usize = 512;

/// Phase vocoder time stretcher.
///
/// `ratio > 1` speeds the signal up (shorter output), `ratio < 1` slows it
/// down. Output length is `round(len / ratio)`; pitch is preserved.
/// A ratio of exactly `1.0` returns the input unchanged.
pub struct TempoShiftTransformer {
    ratio: f64,
}

impl TempoShiftTransformer {
    pub fn new(ratio: f64) -> Result<Self, AugmentError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(AugmentError::configuration(format!(
                "tempo ratio must be a positive number, got {ratio}"
            )));
        }
        Ok(Self { ratio })
    }

    pub fn is_identity(&self) -> bool {
        self.ratio == 1.0
    }
}

impl AudioTransformer for TempoShiftTransformer {
    fn name(&self) -> &'static str {
        "tempo"
    }

    fn transform(
        &self,
        audio: &mut AudioSegment,
        _rng: &mut dyn RngCore,
    ) -> Result<(), AugmentError> {
        if self.is_identity() || audio.is_empty() {
            return Ok(());
        }
        let stretched = time_stretch(audio.samples(), self.ratio);
        audio.set_samples(stretched);
        Ok(())
    }
}

/// Stretch `samples` in time by `1 / ratio` without changing pitch.
///
/// Centred STFT -> phase-advance resynthesis at fractional analysis steps of
/// `ratio` frames -> ISTFT with overlap-add, trimmed to `round(len / ratio)`.
pub fn time_stretch(samples: &[f32], ratio: f64) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let target_len = ((n as f64 / ratio).round() as usize).max(1);
    let half_window = WINDOW_SIZE / 2 + 1;
    let pad = WINDOW_SIZE / 2;

    // Centre frames on the signal by zero-padding half a window on each side.
    let mut padded = vec![0.0f64; n + 2 * pad];
    for (dst, &src) in padded[pad..pad + n].iter_mut().zip(samples) {
        *dst = src as f64;
    }
    if padded.len() < WINDOW_SIZE {
        padded.resize(WINDOW_SIZE, 0.0);
    }

    // Precompute Hann window
    let hann: Vec<f64> = (0..WINDOW_SIZE)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / WINDOW_SIZE as f64).cos()))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft_forward = planner.plan_fft_forward(WINDOW_SIZE);
    let fft_inverse = planner.plan_fft_inverse(WINDOW_SIZE);

    // Analysis: positive-frequency half of every frame.
    let num_frames = (padded.len() - WINDOW_SIZE) / HOP_SIZE + 1;
    let spectra: Vec<Vec<Complex<f64>>> = (0..num_frames)
        .map(|frame_idx| {
            let start = frame_idx * HOP_SIZE;
            let mut buf: Vec<Complex<f64>> = (0..WINDOW_SIZE)
                .map(|i| Complex::new(padded[start + i] * hann[i], 0.0))
                .collect();
            fft_forward.process(&mut buf);
            buf.truncate(half_window);
            buf
        })
        .collect();
    let silent_frame = vec![Complex::new(0.0, 0.0); half_window];

    let expected_phase_advance: Vec<f64> = (0..half_window)
        .map(|k| 2.0 * PI * k as f64 * HOP_SIZE as f64 / WINDOW_SIZE as f64)
        .collect();

    let num_synth_frames = (num_frames as f64 / ratio).ceil() as usize;
    let out_len = ((num_synth_frames.saturating_sub(1)) * HOP_SIZE + WINDOW_SIZE)
        .max(target_len + 2 * pad);
    let mut output = vec![0.0f64; out_len];
    let mut window_sum = vec![0.0f64; out_len];

    let mut phase_acc: Vec<f64> = spectra[0].iter().map(|c| c.arg()).collect();
    let norm = 1.0 / WINDOW_SIZE as f64;

    for synth_idx in 0..num_synth_frames {
        let step = synth_idx as f64 * ratio;
        let left_idx = step.floor() as usize;
        if left_idx >= num_frames {
            break;
        }
        let alpha = step - left_idx as f64;
        let left = &spectra[left_idx];
        let right = spectra.get(left_idx + 1).unwrap_or(&silent_frame);

        // Reconstruct a frame from interpolated magnitude and accumulated phase.
        let mut synth_buf = vec![Complex::new(0.0, 0.0); WINDOW_SIZE];
        for k in 0..half_window {
            let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
            synth_buf[k] = Complex::from_polar(magnitude, phase_acc[k]);
        }
        // Mirror for negative frequencies (conjugate symmetry for real output)
        for k in 1..half_window - 1 {
            synth_buf[WINDOW_SIZE - k] = synth_buf[k].conj();
        }

        // Advance phase by the measured per-hop rotation of each bin.
        for k in 0..half_window {
            let deviation = right[k].arg() - left[k].arg() - expected_phase_advance[k];
            let wrapped = deviation - (2.0 * PI) * (deviation / (2.0 * PI)).round();
            phase_acc[k] += expected_phase_advance[k] + wrapped;
        }

        fft_inverse.process(&mut synth_buf);

        let start = synth_idx * HOP_SIZE;
        for i in 0..WINDOW_SIZE {
            output[start + i] += synth_buf[i].re * norm * hann[i];
            window_sum[start + i] += hann[i] * hann[i];
        }
    }

    // Only trust samples covered by enough window energy; the rest lies in
    // the padding and is trimmed or silenced.
    let max_window_sum = window_sum.iter().cloned().fold(0.0f64, f64::max);
    let ws_threshold = max_window_sum * 0.1;

    (pad..pad + target_len)
        .map(|i| {
            if window_sum[i] >= ws_threshold && window_sum[i] > 0.0 {
                (output[i] / window_sum[i]) as f32
            } else {
                0.0
            }
        })
        .collect()
}
