//! # Pitch Detection Module
//!
//! This module implements autocorrelation-based pitch detection optimized for
//! plucked-string instruments. One detector instance turns one window of
//! time-domain samples into an optional fundamental-frequency estimate.
//!
//! ## Features
//! - Adaptive noise gate that tracks the ambient floor between notes
//! - First-peak autocorrelation search to avoid octave-up harmonic errors
//! - Parabolic interpolation for sub-sample lag accuracy
//! - FFT-accelerated autocorrelation for large analysis windows

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Minimum gate threshold so silence is never treated as signal.
const MIN_THRESHOLD: f32 = 0.001;
/// Signal must be this many times above the noise floor to open the gate.
const NOISE_GATE_RATIO: f32 = 4.0;
/// How fast the noise floor adapts upward (lower = slower, more stable).
const NOISE_FLOOR_DECAY: f32 = 0.05;
/// Starting noise floor before any audio has been observed.
const INITIAL_NOISE_FLOOR: f32 = 0.01;
/// A candidate peak must reach this fraction of the strongest correlation.
const PEAK_RATIO: f32 = 0.8;
/// Windows at least this large use the FFT autocorrelation path.
const FFT_AUTOCORR_MIN: usize = 2048;

/// Detection bounds and analysis window size for one instrument family.
///
/// The frequency range bounds both the lag search and the final sanity check;
/// the window size determines frequency resolution and analysis cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionConfig {
    /// Lowest detectable frequency in Hz.
    pub min_freq: f32,
    /// Highest detectable frequency in Hz.
    pub max_freq: f32,
    /// Samples per analysis window.
    pub window_size: usize,
}

impl DetectionConfig {
    /// Creates a detection configuration.
    pub const fn new(min_freq: f32, max_freq: f32, window_size: usize) -> Self {
        Self {
            min_freq,
            max_freq,
            window_size,
        }
    }
}

/// Autocorrelation pitch detector with an adaptive noise gate.
///
/// The noise floor is an explicit field owned by one instance; two detectors
/// never share gating state. Estimates returned by [`PitchDetector::process`]
/// are guaranteed to lie within the configured frequency range.
pub struct PitchDetector {
    config: DetectionConfig,
    sample_rate: u32,
    noise_floor: f32,
    correlations: Vec<f32>,
    fft: Option<FftPlan>,
}

/// Cached FFT plans and scratch buffers for the fast autocorrelation path.
struct FftPlan {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    size: usize,
    signal: Vec<Complex<f32>>,
    probe: Vec<Complex<f32>>,
}

impl PitchDetector {
    /// Creates a detector for the given configuration and sample rate.
    ///
    /// FFT plans are built once here; per-window processing allocates nothing
    /// after the first call.
    pub fn new(config: DetectionConfig, sample_rate: u32) -> Self {
        let fft = (config.window_size >= FFT_AUTOCORR_MIN).then(|| {
            let mut planner = FftPlanner::new();
            FftPlan {
                forward: planner.plan_fft_forward(config.window_size),
                inverse: planner.plan_fft_inverse(config.window_size),
                size: config.window_size,
                signal: Vec::with_capacity(config.window_size),
                probe: Vec::with_capacity(config.window_size),
            }
        });
        Self {
            config,
            sample_rate,
            noise_floor: INITIAL_NOISE_FLOOR,
            correlations: Vec::new(),
            fft,
        }
    }

    /// The configuration this detector was built with.
    pub fn config(&self) -> DetectionConfig {
        self.config
    }

    /// Clears the adaptive noise floor for a fresh listening session.
    pub fn reset(&mut self) {
        self.noise_floor = INITIAL_NOISE_FLOOR;
    }

    /// Processes one sample window and returns the detected fundamental.
    ///
    /// Returns `None` for silence, noise, or anything outside the configured
    /// frequency range. Every call adapts the noise floor, including gated
    /// ones.
    ///
    /// # Arguments
    /// * `window` - Time-domain samples in [-1, 1]
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected fundamental in Hz
    /// * `None` - No pitch this frame
    pub fn process(&mut self, window: &[f32]) -> Option<f32> {
        let size = window.len();
        if size < 4 {
            return None;
        }
        let half = size / 2;

        // --- Step 1: RMS energy of the window ---
        let rms = (window.iter().map(|&s| s * s).sum::<f32>() / size as f32).sqrt();

        // --- Step 2: adapt the noise floor ---
        // Track quiet periods down immediately; creep up when the level sits
        // just above the floor. A sudden loud window is signal, not noise.
        if rms < self.noise_floor {
            self.noise_floor = rms;
        } else if rms < self.noise_floor * 2.0 {
            self.noise_floor += (rms - self.noise_floor) * NOISE_FLOOR_DECAY;
        }

        // --- Step 3: noise gate ---
        let threshold = (self.noise_floor * NOISE_GATE_RATIO).max(MIN_THRESHOLD);
        if rms < threshold {
            return None;
        }

        // --- Step 4: autocorrelation over lags [0, size/2) ---
        self.autocorrelate(window);

        // --- Step 5: restrict the lag search to the configured pitch range ---
        let min_lag = ((self.sample_rate as f32 / self.config.max_freq) as usize).max(1);
        let max_lag = ((self.sample_rate as f32 / self.config.min_freq) as usize).min(half);
        if min_lag >= max_lag {
            return None;
        }

        // --- Step 6: strongest correlation in range, as the peak reference ---
        let mut max_corr = 0.0_f32;
        for lag in min_lag..max_lag {
            if self.correlations[lag] > max_corr {
                max_corr = self.correlations[lag];
            }
        }

        // --- Step 7: first qualifying peak, not the global maximum ---
        // String harmonics can put a taller peak at half the period (an
        // octave up); the first peak past the threshold is the fundamental.
        let peak_threshold = max_corr * PEAK_RATIO;
        let mut peak_lag = 0;
        for lag in min_lag..max_lag {
            let current = self.correlations[lag];
            let prev = self.correlations[lag - 1];
            let next = if lag + 1 < half {
                self.correlations[lag + 1]
            } else {
                0.0
            };
            if current > prev && current >= next && current >= peak_threshold {
                peak_lag = lag;
                break;
            }
        }
        if peak_lag == 0 {
            return None;
        }

        // --- Step 8: parabolic interpolation around the chosen lag ---
        let y1 = self.correlations[peak_lag - 1];
        let y2 = self.correlations[peak_lag];
        let y3 = if peak_lag + 1 < half {
            self.correlations[peak_lag + 1]
        } else {
            0.0
        };
        let denominator = 2.0 * (2.0 * y2 - y1 - y3);
        let shift = if denominator.abs() > f32::EPSILON {
            (y3 - y1) / denominator
        } else {
            0.0
        };
        let refined_lag = if shift.is_finite() {
            peak_lag as f32 + shift
        } else {
            peak_lag as f32
        };

        let frequency = self.sample_rate as f32 / refined_lag;

        // Out-of-range results are discarded, not clamped.
        if frequency >= self.config.min_freq && frequency <= self.config.max_freq {
            Some(frequency)
        } else {
            None
        }
    }

    /// Fills `self.correlations[lag]` with `sum(window[i] * window[i + lag])`
    /// for `i` in `[0, len/2)`, picking the FFT path when a matching plan
    /// exists.
    fn autocorrelate(&mut self, window: &[f32]) {
        let half = window.len() / 2;
        self.correlations.resize(half, 0.0);
        if let Some(plan) = self.fft.as_mut() {
            if plan.size == window.len() {
                plan.run(window, &mut self.correlations);
                return;
            }
        }
        direct_autocorrelation(window, &mut self.correlations);
    }
}

/// Reference O(n²) autocorrelation over the first half of the window.
fn direct_autocorrelation(window: &[f32], out: &mut [f32]) {
    let half = window.len() / 2;
    for (lag, slot) in out.iter_mut().enumerate().take(half) {
        let mut sum = 0.0;
        for i in 0..half {
            sum += window[i] * window[i + lag];
        }
        *slot = sum;
    }
}

impl FftPlan {
    /// FFT form of [`direct_autocorrelation`].
    ///
    /// Cross-correlates the first half of the window (zero-padded) against
    /// the full window via conjugate multiplication in the frequency domain.
    /// The probe is zero beyond `size/2` and lags stay below `size/2`, so the
    /// circular correlation never wraps and the result matches the direct
    /// form within floating tolerance.
    fn run(&mut self, window: &[f32], out: &mut [f32]) {
        let size = self.size;
        let half = size / 2;

        self.signal.clear();
        self.signal
            .extend(window.iter().map(|&s| Complex::new(s, 0.0)));
        self.probe.clear();
        self.probe
            .extend(window[..half].iter().map(|&s| Complex::new(s, 0.0)));
        self.probe.resize(size, Complex::new(0.0, 0.0));

        self.forward.process(&mut self.signal);
        self.forward.process(&mut self.probe);
        for (s, p) in self.signal.iter_mut().zip(self.probe.iter()) {
            *s = p.conj() * *s;
        }
        self.inverse.process(&mut self.signal);

        // rustfft leaves the inverse transform unnormalized.
        let scale = 1.0 / size as f32;
        for (lag, slot) in out.iter_mut().enumerate().take(half) {
            *slot = self.signal[lag].re * scale;
        }
    }
}
