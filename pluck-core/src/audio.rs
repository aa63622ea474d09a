//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library). It opens the default input device, accumulates the stream
//! into fixed-size analysis windows, and hands them to the analysis side over
//! a channel.
//!
//! ## Features
//! - Automatic input device selection
//! - Mono 32-bit float capture at the rate closest to 44.1 kHz
//! - Frame accumulation to the configured window size
//! - Typed errors for the fatal failure modes

use crate::detector::DetectionConfig;
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use thiserror::Error;

/// Preferred capture sample rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Fatal capture failures. Expected "no signal" conditions are never errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The platform refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,
    /// No input device, or the device disappeared.
    #[error("no audio input device available")]
    DeviceUnavailable,
    /// The device offers no mono f32 input format.
    #[error("no suitable mono f32 input format found")]
    UnsupportedFormat,
    /// Any other backend failure.
    #[error("audio stream error: {0}")]
    Stream(String),
}

fn is_permission(description: &str) -> bool {
    let lowered = description.to_ascii_lowercase();
    lowered.contains("permission")
        || lowered.contains("denied")
        || lowered.contains("not permitted")
}

impl From<cpal::SupportedStreamConfigsError> for CaptureError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        match err {
            cpal::SupportedStreamConfigsError::DeviceNotAvailable => {
                CaptureError::DeviceUnavailable
            }
            cpal::SupportedStreamConfigsError::BackendSpecific { err }
                if is_permission(&err.description) =>
            {
                CaptureError::PermissionDenied
            }
            other => CaptureError::Stream(other.to_string()),
        }
    }
}

impl From<cpal::BuildStreamError> for CaptureError {
    fn from(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            cpal::BuildStreamError::BackendSpecific { err } if is_permission(&err.description) => {
                CaptureError::PermissionDenied
            }
            other => CaptureError::Stream(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for CaptureError {
    fn from(err: cpal::PlayStreamError) -> Self {
        match err {
            cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            other => CaptureError::Stream(other.to_string()),
        }
    }
}

/// Starts audio capture from the default input device.
///
/// The stream callback accumulates samples and sends one `Vec<f32>` of
/// exactly `config.window_size` samples per analysis frame. Frames are
/// dropped (`try_send`) when the analysis side falls behind; the most recent
/// audio always wins.
///
/// Dropping the returned stream ends the session.
///
/// # Arguments
/// * `config` - Detection configuration; only the window size matters here
/// * `sender` - Channel sender for streaming frames to the analysis thread
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle and its actual rate
/// * `Err(e)` - One of the fatal failure modes
pub fn start_capture(
    config: &DetectionConfig,
    sender: Sender<Vec<f32>>,
) -> Result<(cpal::Stream, u32), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::DeviceUnavailable)?;

    log::info!(
        "using audio input device: {}",
        device.name().unwrap_or_else(|_| "unknown".into())
    );

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or(CaptureError::UnsupportedFormat)?;

    let sample_rate =
        TARGET_SAMPLE_RATE.clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
    let stream_config: cpal::StreamConfig = supported
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();

    log::info!("selected sample rate: {sample_rate} Hz");

    let window_size = config.window_size;
    // This buffer accumulates audio data from the callback.
    let mut accumulator: Vec<f32> = Vec::with_capacity(window_size * 2);
    let err_fn = |err| log::error!("audio stream error: {err}");

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            accumulator.extend_from_slice(data);

            // While we have enough data for a full frame, ship it.
            while accumulator.len() >= window_size {
                let frame = accumulator[..window_size].to_vec();
                let _ = sender.try_send(frame);
                accumulator.drain(..window_size);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported configuration for the target sample rate.
///
/// Filters to mono 32-bit float and picks the range whose bounds come
/// closest to the target.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
