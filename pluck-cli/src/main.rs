//! # Pluck - Terminal String-Instrument Tuner
//!
//! Thin frontend over `pluck-core`: parses the instrument/tuning selection,
//! wires the capture stream to the analysis pipeline, and redraws one status
//! line per frame.
//!
//! ## Architecture
//! - **Capture**: CPAL callback thread producing fixed-size sample windows
//! - **Analysis**: main thread consuming windows through a bounded channel
//! - **Display**: carriage-return rewritten meter line, no full TUI

use anyhow::{Result, anyhow};
use clap::Parser;
use pluck_core::{Output, Tuner, TunerParams, audio, tuning};
use std::io::Write;

/// Meter cells across the display; the middle cell is dead-on.
const METER_CELLS: usize = 31;
/// Deviation clamped to this many cents at the meter's edge.
const MAX_METER_CENTS: f32 = 50.0;
/// Inside this band the note counts as in tune.
const IN_TUNE_CENTS: f32 = 5.0;

#[derive(Parser, Debug)]
#[command(name = "pluck", about = "Tune a string instrument from the terminal")]
struct Cli {
    /// Instrument to tune (guitar, bass, ukulele, mandolin, banjo)
    #[arg(short, long, default_value = "guitar")]
    instrument: String,

    /// Tuning preset; defaults to the instrument's standard tuning
    #[arg(short, long)]
    tuning: Option<String>,

    /// Smoothing factor in (0, 1]; lower is smoother but laggier
    #[arg(long, default_value_t = 0.2)]
    alpha: f32,

    /// Frames a new note must persist before the display switches
    #[arg(long, default_value_t = 8)]
    hold_frames: u32,

    /// List available instruments and tunings, then exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        print_registry();
        return Ok(());
    }

    let instrument = tuning::find_instrument(&cli.instrument)
        .ok_or_else(|| anyhow!("unknown instrument '{}' (try --list)", cli.instrument))?;
    let tuning_key = cli
        .tuning
        .as_deref()
        .unwrap_or(instrument.default_tuning_key);
    let selected = instrument.find_tuning(tuning_key).ok_or_else(|| {
        anyhow!(
            "unknown tuning '{}' for {} (try --list)",
            tuning_key,
            instrument.name
        )
    })?;

    // Bounded so the capture side drops frames instead of queueing stale
    // audio when analysis falls behind.
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);
    let (_stream, sample_rate) = audio::start_capture(&instrument.detection, frame_tx)?;
    log::info!(
        "analysis window: {} samples (~{} ms)",
        instrument.detection.window_size,
        instrument.detection.window_size * 1000 / sample_rate as usize
    );

    let mut tuner = Tuner::new(
        instrument.detection,
        sample_rate,
        selected.clone(),
        TunerParams {
            alpha: cli.alpha,
            hold_frames: cli.hold_frames,
        },
    );

    println!(
        "{} — {} ({})",
        instrument.name,
        selected.name,
        selected.notes_short()
    );
    println!("Play a string. Press Ctrl-C to quit.");

    let mut stdout = std::io::stdout();
    for window in frame_rx {
        let line = render(tuner.step(&window));
        write!(stdout, "\r{line:<78}")?;
        stdout.flush()?;
    }

    // The channel only closes when the stream (and its sender) is gone.
    Ok(())
}

/// Formats one frame's reading as a fixed-width status line.
fn render(output: Output) -> String {
    match output {
        Output::Silence => format!("  --   {}  listening...", meter(None)),
        Output::Detected {
            pitch,
            cents,
            frequency,
        } => format!(
            "  {:<4} {}  {:>7.2} Hz  {:>+6.1} cents  {} ({})",
            format!("{}{}", pitch.note, pitch.octave),
            meter(Some(cents)),
            frequency,
            cents,
            hint(cents),
            pitch.label,
        ),
    }
}

/// Draws the cents meter: a filled cell at the deviation, a bar at center.
fn meter(cents: Option<f32>) -> String {
    let center = METER_CELLS / 2;
    let active = cents.map(|c| {
        let clamped = c.clamp(-MAX_METER_CENTS, MAX_METER_CENTS);
        (center as f32 + clamped / MAX_METER_CENTS * center as f32).round() as usize
    });
    (0..METER_CELLS)
        .map(|i| {
            if Some(i) == active {
                '█'
            } else if i == center {
                '|'
            } else {
                '·'
            }
        })
        .collect()
}

/// Human hint matching the meter reading.
fn hint(cents: f32) -> &'static str {
    if cents.abs() < IN_TUNE_CENTS {
        "in tune"
    } else if cents < -25.0 {
        "tune up"
    } else if cents < 0.0 {
        "tune up slightly"
    } else if cents > 25.0 {
        "tune down"
    } else {
        "tune down slightly"
    }
}

/// Prints every instrument and tuning the registry knows.
fn print_registry() {
    for instrument in tuning::instruments() {
        println!("{} ({})", instrument.name, instrument.key);
        for preset in &instrument.tunings {
            let marker = if preset.key == instrument.default_tuning_key {
                "*"
            } else {
                " "
            };
            println!(
                "  {marker} {:<16} {:<18} [{}]",
                preset.key,
                preset.name,
                preset.notes_short()
            );
        }
    }
    println!("\n* default tuning");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_centers_when_in_tune() {
        let drawn = meter(Some(0.0));
        let center = METER_CELLS / 2;
        assert_eq!(drawn.chars().nth(center), Some('█'));
    }

    #[test]
    fn meter_clamps_at_the_edges() {
        let flat = meter(Some(-500.0));
        assert_eq!(flat.chars().next(), Some('█'));
        let sharp = meter(Some(500.0));
        assert_eq!(sharp.chars().last(), Some('█'));
    }

    #[test]
    fn hints_follow_the_deviation() {
        assert_eq!(hint(0.0), "in tune");
        assert_eq!(hint(-40.0), "tune up");
        assert_eq!(hint(-10.0), "tune up slightly");
        assert_eq!(hint(40.0), "tune down");
        assert_eq!(hint(10.0), "tune down slightly");
    }
}
