// pluck-core/src/lib.rs

//! The core logic for the Pluck string-instrument tuner.
//! This crate is responsible for audio capture, pitch detection,
//! estimate smoothing, and note resolution. It is completely headless
//! and contains no terminal or GUI code.
//!
//! The pipeline is frame-driven: the host feeds one sample window per tick
//! into [`Tuner::step`] and receives one [`Output`], either `Silence` or a
//! displayed note with its deviation in cents.

pub mod audio;
pub mod detector;
pub mod pipeline;
pub mod resolver;
pub mod smoothing;
pub mod tuning;

pub use audio::CaptureError;
pub use detector::{DetectionConfig, PitchDetector};
pub use pipeline::{Output, Tuner, TunerParams};
pub use resolver::{NoteResolver, ResolvedNote};
pub use smoothing::FrequencySmoother;
pub use tuning::{Instrument, StringPitch, Tuning};
