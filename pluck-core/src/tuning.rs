//! # Instrument & Tuning Registry
//!
//! This module provides the musical reference data for the tuner: note
//! frequency calculations, cent deviation measurements, and the static
//! registry of instruments with their tunings and detection settings.
//!
//! ## Features
//! - Equal temperament frequency calculations (A4 = 440 Hz)
//! - Sharp and flat note-name spellings
//! - Cent deviation calculations for tuning accuracy
//! - Built-in tunings for guitar, bass, ukulele, mandolin, and banjo

use crate::detector::DetectionConfig;
use once_cell::sync::Lazy;

/// One target pitch in a tuning: what to display and what to tune toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringPitch {
    /// Note symbol (e.g., "E", "C#", "Bb").
    pub note: &'static str,
    /// Scientific-pitch octave number.
    pub octave: u8,
    /// Target frequency in Hz.
    pub frequency: f32,
    /// Display label (e.g., "6th string").
    pub label: &'static str,
}

impl StringPitch {
    /// Creates a string pitch with its frequency derived from equal
    /// temperament.
    pub fn new(note: &'static str, octave: u8, label: &'static str) -> Self {
        Self {
            note,
            octave,
            frequency: note_frequency(note, octave),
            label,
        }
    }
}

/// An ordered, immutable set of target pitches for one tuning preset.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Stable lookup key (e.g., "drop-d").
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Target pitches in instrument order (lowest-numbered string last).
    pub strings: Vec<StringPitch>,
}

impl Tuning {
    /// Short note summary, e.g. "E A D G B E".
    pub fn notes_short(&self) -> String {
        self.strings
            .iter()
            .map(|s| s.note)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An instrument family: its detection settings and available tunings.
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Stable lookup key (e.g., "guitar").
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Detection bounds and window size for this instrument's range.
    pub detection: DetectionConfig,
    /// Key of the tuning selected by default.
    pub default_tuning_key: &'static str,
    /// Available tuning presets.
    pub tunings: Vec<Tuning>,
}

impl Instrument {
    /// Looks up a tuning preset by key.
    pub fn find_tuning(&self, key: &str) -> Option<&Tuning> {
        self.tunings.iter().find(|t| t.key == key)
    }

    /// The tuning selected when none is requested.
    pub fn default_tuning(&self) -> &Tuning {
        self.find_tuning(self.default_tuning_key)
            .unwrap_or(&self.tunings[0])
    }
}

/// Semitone offset of a note name within the octave (C = 0).
///
/// Accepts both sharp and flat spellings; unknown names fall back to A,
/// mirroring the lenient lookups elsewhere in the registry.
fn pitch_class(note: &str) -> i32 {
    match note {
        "C" => 0,
        "C#" | "Db" => 1,
        "D" => 2,
        "D#" | "Eb" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "Gb" => 6,
        "G" => 7,
        "G#" | "Ab" => 8,
        "A" => 9,
        "A#" | "Bb" => 10,
        "B" => 11,
        _ => 9,
    }
}

/// Equal-temperament frequency of a note, relative to A4 = 440 Hz.
///
/// The formula is f = 440 · 2^(n/12) where n is the signed semitone distance
/// from A4.
pub fn note_frequency(note: &str, octave: u8) -> f32 {
    let semitones = (octave as i32 * 12 + pitch_class(note)) - (4 * 12 + 9);
    440.0 * 2.0_f32.powf(semitones as f32 / 12.0)
}

/// Calculates the deviation of a frequency from a target in cents.
///
/// 100 cents = 1 semitone, 1200 cents = 1 octave. Positive values are sharp,
/// negative values are flat.
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Shorthand for registry construction.
fn string(note: &'static str, octave: u8, label: &'static str) -> StringPitch {
    StringPitch::new(note, octave, label)
}

/// Static registry of supported instruments.
///
/// Detection ranges leave headroom below the lowest and above the highest
/// string across all of an instrument's tunings, so every preset is
/// reachable.
static INSTRUMENTS: Lazy<Vec<Instrument>> = Lazy::new(|| {
    vec![
        Instrument {
            key: "guitar",
            name: "Guitar",
            detection: DetectionConfig::new(60.0, 400.0, 4096),
            default_tuning_key: "standard",
            tunings: vec![
                Tuning {
                    key: "standard",
                    name: "Standard",
                    strings: vec![
                        string("E", 2, "6th string"),
                        string("A", 2, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("B", 3, "2nd string"),
                        string("E", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "drop-d",
                    name: "Drop D",
                    strings: vec![
                        string("D", 2, "6th string"),
                        string("A", 2, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("B", 3, "2nd string"),
                        string("E", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "half-step-down",
                    name: "Half Step Down",
                    strings: vec![
                        string("Eb", 2, "6th string"),
                        string("Ab", 2, "5th string"),
                        string("Db", 3, "4th string"),
                        string("Gb", 3, "3rd string"),
                        string("Bb", 3, "2nd string"),
                        string("Eb", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "full-step-down",
                    name: "Full Step Down",
                    strings: vec![
                        string("D", 2, "6th string"),
                        string("G", 2, "5th string"),
                        string("C", 3, "4th string"),
                        string("F", 3, "3rd string"),
                        string("A", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "open-g",
                    name: "Open G",
                    strings: vec![
                        string("D", 2, "6th string"),
                        string("G", 2, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("B", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "open-d",
                    name: "Open D",
                    strings: vec![
                        string("D", 2, "6th string"),
                        string("A", 2, "5th string"),
                        string("D", 3, "4th string"),
                        string("F#", 3, "3rd string"),
                        string("A", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "dadgad",
                    name: "DADGAD",
                    strings: vec![
                        string("D", 2, "6th string"),
                        string("A", 2, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("A", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "drop-c",
                    name: "Drop C",
                    strings: vec![
                        string("C", 2, "6th string"),
                        string("G", 2, "5th string"),
                        string("C", 3, "4th string"),
                        string("F", 3, "3rd string"),
                        string("A", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
            ],
        },
        Instrument {
            key: "bass",
            name: "Bass",
            detection: DetectionConfig::new(30.0, 150.0, 8192),
            default_tuning_key: "standard",
            tunings: vec![
                Tuning {
                    key: "standard",
                    name: "Standard",
                    strings: vec![
                        string("E", 1, "4th string"),
                        string("A", 1, "3rd string"),
                        string("D", 2, "2nd string"),
                        string("G", 2, "1st string"),
                    ],
                },
                Tuning {
                    key: "drop-d",
                    name: "Drop D",
                    strings: vec![
                        string("D", 1, "4th string"),
                        string("A", 1, "3rd string"),
                        string("D", 2, "2nd string"),
                        string("G", 2, "1st string"),
                    ],
                },
                Tuning {
                    key: "half-step-down",
                    name: "Half Step Down",
                    strings: vec![
                        string("Eb", 1, "4th string"),
                        string("Ab", 1, "3rd string"),
                        string("Db", 2, "2nd string"),
                        string("Gb", 2, "1st string"),
                    ],
                },
                Tuning {
                    key: "five-string",
                    name: "5-String Standard",
                    strings: vec![
                        string("B", 0, "5th string"),
                        string("E", 1, "4th string"),
                        string("A", 1, "3rd string"),
                        string("D", 2, "2nd string"),
                        string("G", 2, "1st string"),
                    ],
                },
            ],
        },
        Instrument {
            key: "ukulele",
            name: "Ukulele",
            detection: DetectionConfig::new(140.0, 500.0, 4096),
            default_tuning_key: "standard",
            tunings: vec![
                Tuning {
                    key: "standard",
                    name: "Standard",
                    strings: vec![
                        string("G", 4, "4th string"),
                        string("C", 4, "3rd string"),
                        string("E", 4, "2nd string"),
                        string("A", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "low-g",
                    name: "Low G",
                    strings: vec![
                        string("G", 3, "4th string"),
                        string("C", 4, "3rd string"),
                        string("E", 4, "2nd string"),
                        string("A", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "baritone",
                    name: "Baritone",
                    strings: vec![
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("B", 3, "2nd string"),
                        string("E", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "d-tuning",
                    name: "D Tuning",
                    strings: vec![
                        string("A", 4, "4th string"),
                        string("D", 4, "3rd string"),
                        string("F#", 4, "2nd string"),
                        string("B", 4, "1st string"),
                    ],
                },
            ],
        },
        Instrument {
            key: "mandolin",
            name: "Mandolin",
            detection: DetectionConfig::new(90.0, 700.0, 4096),
            default_tuning_key: "standard",
            tunings: vec![
                Tuning {
                    key: "standard",
                    name: "Standard",
                    strings: vec![
                        string("G", 3, "4th course"),
                        string("D", 4, "3rd course"),
                        string("A", 4, "2nd course"),
                        string("E", 5, "1st course"),
                    ],
                },
                Tuning {
                    key: "octave",
                    name: "Octave Mandolin",
                    strings: vec![
                        string("G", 2, "4th course"),
                        string("D", 3, "3rd course"),
                        string("A", 3, "2nd course"),
                        string("E", 4, "1st course"),
                    ],
                },
            ],
        },
        Instrument {
            key: "banjo",
            name: "Banjo",
            detection: DetectionConfig::new(120.0, 400.0, 4096),
            default_tuning_key: "open-g",
            tunings: vec![
                Tuning {
                    key: "open-g",
                    name: "Open G",
                    strings: vec![
                        string("G", 4, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("B", 3, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "double-c",
                    name: "Double C",
                    strings: vec![
                        string("G", 4, "5th string"),
                        string("C", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("C", 4, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
                Tuning {
                    key: "sawmill",
                    name: "Sawmill (G Modal)",
                    strings: vec![
                        string("G", 4, "5th string"),
                        string("D", 3, "4th string"),
                        string("G", 3, "3rd string"),
                        string("C", 4, "2nd string"),
                        string("D", 4, "1st string"),
                    ],
                },
            ],
        },
    ]
});

/// All supported instruments, in display order.
pub fn instruments() -> &'static [Instrument] {
    &INSTRUMENTS
}

/// Looks up an instrument by key.
pub fn find_instrument(key: &str) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_deviation_reference_points() {
        assert!((cents_deviation(440.0, 440.0)).abs() < 1e-6);
        assert!((cents_deviation(466.16, 440.0) - 100.0).abs() < 0.2);
        assert!((cents_deviation(220.0, 440.0) + 1200.0).abs() < 1e-3);
    }

    #[test]
    fn equal_temperament_matches_reference_table() {
        // Standard guitar strings, published to two decimals.
        let expected = [
            ("E", 2, 82.41),
            ("A", 2, 110.0),
            ("D", 3, 146.83),
            ("G", 3, 196.0),
            ("B", 3, 246.94),
            ("E", 4, 329.63),
        ];
        for (note, octave, freq) in expected {
            let derived = note_frequency(note, octave);
            assert!(
                (derived - freq).abs() < 0.01,
                "{note}{octave}: derived {derived}, expected {freq}"
            );
        }
    }

    #[test]
    fn flat_spellings_resolve() {
        assert!((note_frequency("Eb", 2) - 77.78).abs() < 0.01);
        assert!((note_frequency("Bb", 3) - 233.08).abs() < 0.01);
        assert!((note_frequency("Gb", 3) - note_frequency("F#", 3)).abs() < 1e-6);
    }

    #[test]
    fn registry_lookup() {
        assert_eq!(instruments().len(), 5);
        let guitar = find_instrument("guitar").unwrap();
        assert_eq!(guitar.tunings.len(), 8);
        assert!(guitar.find_tuning("dadgad").is_some());
        assert!(find_instrument("theremin").is_none());
    }

    #[test]
    fn every_default_tuning_resolves() {
        for instrument in instruments() {
            let default = instrument.default_tuning();
            assert_eq!(default.key, instrument.default_tuning_key);
        }
    }

    #[test]
    fn every_string_is_inside_its_detection_range() {
        for instrument in instruments() {
            for tuning in &instrument.tunings {
                assert!(!tuning.strings.is_empty());
                for s in &tuning.strings {
                    assert!(
                        s.frequency >= instrument.detection.min_freq
                            && s.frequency <= instrument.detection.max_freq,
                        "{} {} {}{} at {} Hz escapes {:?}",
                        instrument.key,
                        tuning.key,
                        s.note,
                        s.octave,
                        s.frequency,
                        instrument.detection
                    );
                }
            }
        }
    }

    #[test]
    fn notes_short_joins_symbols() {
        let guitar = find_instrument("guitar").unwrap();
        assert_eq!(guitar.default_tuning().notes_short(), "E A D G B E");
    }
}
