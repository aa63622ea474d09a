//! # Tuner Pipeline
//!
//! Composes the detector, smoother, and resolver into one deterministic
//! transition: one sample window in, one [`Output`] out. The core owns no
//! timer and no loop; the host drives it once per tick, and correctness does
//! not depend on how evenly those ticks arrive.

use crate::detector::{DetectionConfig, PitchDetector};
use crate::resolver::{DEFAULT_HOLD_FRAMES, NoteResolver};
use crate::smoothing::{DEFAULT_ALPHA, FrequencySmoother};
use crate::tuning::{StringPitch, Tuning};

/// Per-frame reading handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    /// No usable signal this frame.
    Silence,
    /// A displayed note with its deviation from target.
    Detected {
        /// The pitch on display.
        pitch: StringPitch,
        /// Deviation from the target in cents (positive = sharp).
        cents: f32,
        /// The smoothed frequency the reading was resolved from, in Hz.
        frequency: f32,
    },
}

/// Smoothing and hysteresis knobs.
#[derive(Debug, Clone, Copy)]
pub struct TunerParams {
    /// Exponential smoothing factor (lower = smoother, more lag).
    pub alpha: f32,
    /// Consecutive frames a new note must win before the display switches.
    pub hold_frames: u32,
}

impl Default for TunerParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            hold_frames: DEFAULT_HOLD_FRAMES,
        }
    }
}

/// The full analysis pipeline for one listening session.
///
/// All mutable state lives here, behind one `&mut self` entry point; a host
/// that splits capture and display across threads keeps this on the
/// processing thread and publishes only the [`Output`] values.
pub struct Tuner {
    detector: PitchDetector,
    smoother: FrequencySmoother,
    resolver: NoteResolver,
    tuning: Tuning,
}

impl Tuner {
    /// Creates a pipeline for one instrument configuration and tuning.
    pub fn new(
        config: DetectionConfig,
        sample_rate: u32,
        tuning: Tuning,
        params: TunerParams,
    ) -> Self {
        Self {
            detector: PitchDetector::new(config, sample_rate),
            smoother: FrequencySmoother::new(params.alpha),
            resolver: NoteResolver::new(params.hold_frames),
            tuning,
        }
    }

    /// Advances the pipeline by one frame.
    ///
    /// A frame with no detector estimate reports [`Output::Silence`]; the
    /// smoother still holds its carried value so a brief dropout does not
    /// restart the settling process when signal returns.
    pub fn step(&mut self, window: &[f32]) -> Output {
        let estimate = self.detector.process(window);
        let smoothed = self.smoother.update(estimate);

        if estimate.is_none() {
            return Output::Silence;
        }
        let Some(frequency) = smoothed else {
            return Output::Silence;
        };

        match self.resolver.resolve(frequency, &self.tuning) {
            Some(resolved) => Output::Detected {
                pitch: resolved.pitch,
                cents: resolved.cents,
                frequency,
            },
            None => Output::Silence,
        }
    }

    /// Swaps the reference tuning and fully resets session state.
    ///
    /// Detector floor, smoothing history, and display lock all restart; the
    /// old tuning's lock indices mean nothing against the new one.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.reset();
    }

    /// Restarts the session without changing the tuning.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.smoother.reset();
        self.resolver.reset();
    }

    /// The tuning currently resolved against.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }
}
