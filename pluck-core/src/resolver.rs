//! Note matching and display lock.
//!
//! Matching the smoothed frequency to the nearest target is easy; keeping the
//! displayed note from flickering is the real work. Two coupled heuristics
//! handle two distinct flicker sources: a stickiness guard stops oscillation
//! between two targets that sit close to the reading, and a hold-count lock
//! stops single noisy frames from switching the display while a fresh pluck
//! settles.

use crate::tuning::{StringPitch, Tuning, cents_deviation};

/// Within this many cents of the displayed note the guard may hold it.
const STICKY_CENTS: f32 = 40.0;
/// A challenger must beat the displayed note by this margin to proceed.
const STICKY_MARGIN_CENTS: f32 = 10.0;

/// Default number of consecutive frames a new note must win before the
/// display switches. Sensible values run 5–12.
pub const DEFAULT_HOLD_FRAMES: u32 = 8;

/// Note identity used for hysteresis counting.
type NoteKey = (&'static str, u8);

/// Display-lock state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LockState {
    /// Nothing displayed yet; the first match commits immediately.
    Unlocked,
    /// A challenger is accumulating consecutive wins against the display.
    Locking {
        /// Index of the currently displayed string.
        displayed: usize,
        /// Identity of the challenger.
        key: NoteKey,
        /// Consecutive frames the challenger has won.
        count: u32,
    },
    /// A string is displayed with no active challenger.
    Locked {
        /// Index of the currently displayed string.
        displayed: usize,
    },
}

/// The per-frame reading: the displayed pitch and the deviation against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedNote {
    /// The pitch being displayed.
    pub pitch: StringPitch,
    /// Deviation of the input frequency from that pitch, in cents.
    pub cents: f32,
}

/// Matches frequencies against a tuning and owns the display lock.
///
/// State is scoped to one listening session against one tuning; call
/// [`NoteResolver::reset`] whenever the tuning changes or a session restarts,
/// since lock state indexes into the tuning it was built against.
#[derive(Debug, Clone)]
pub struct NoteResolver {
    hold_frames: u32,
    state: LockState,
}

impl NoteResolver {
    /// Creates a resolver with the given hysteresis depth.
    pub fn new(hold_frames: u32) -> Self {
        Self {
            hold_frames: hold_frames.max(1),
            state: LockState::Unlocked,
        }
    }

    /// Clears the displayed note and lock counter.
    pub fn reset(&mut self) {
        self.state = LockState::Unlocked;
    }

    /// Current lock state, mainly for diagnostics.
    pub fn state(&self) -> &LockState {
        &self.state
    }

    /// Resolves one smoothed frequency against the tuning.
    ///
    /// Returns `None` only for an empty tuning. The reported deviation is
    /// always computed against the note being displayed after this frame's
    /// transition, so label and deviation never disagree.
    pub fn resolve(&mut self, freq: f32, tuning: &Tuning) -> Option<ResolvedNote> {
        let nearest = nearest_string(freq, tuning)?;
        let (next, displayed) = advance(&self.state, nearest, freq, tuning, self.hold_frames);
        self.state = next;
        let pitch = tuning.strings[displayed];
        Some(ResolvedNote {
            pitch,
            cents: cents_deviation(freq, pitch.frequency),
        })
    }
}

/// Index of the target with the smallest absolute frequency difference.
///
/// Strict less-than keeps the earliest entry in tuning order on exact ties.
fn nearest_string(freq: f32, tuning: &Tuning) -> Option<usize> {
    let mut best = None;
    let mut best_diff = f32::INFINITY;
    for (i, s) in tuning.strings.iter().enumerate() {
        let diff = (freq - s.frequency).abs();
        if diff < best_diff {
            best_diff = diff;
            best = Some(i);
        }
    }
    best
}

fn key_of(tuning: &Tuning, index: usize) -> NoteKey {
    let s = &tuning.strings[index];
    (s.note, s.octave)
}

/// One step of the display-lock state machine.
///
/// Pure: returns the next state and the index of the string to report.
fn advance(
    state: &LockState,
    nearest: usize,
    freq: f32,
    tuning: &Tuning,
    hold_frames: u32,
) -> (LockState, usize) {
    let displayed = match state {
        // Nothing on screen yet: commit immediately.
        LockState::Unlocked => return (LockState::Locked { displayed: nearest }, nearest),
        LockState::Locking { displayed, .. } | LockState::Locked { displayed } => *displayed,
    };

    // Stickiness guard: while the reading is close to the displayed note, a
    // challenger that is not clearly better never unseats it, and any
    // accumulated challenge resets.
    let cents_current = cents_deviation(freq, tuning.strings[displayed].frequency).abs();
    let cents_candidate = cents_deviation(freq, tuning.strings[nearest].frequency).abs();
    if cents_current < STICKY_CENTS && cents_candidate > cents_current - STICKY_MARGIN_CENTS {
        return (LockState::Locked { displayed }, displayed);
    }

    // Hysteresis: the same challenger must win hold_frames frames in a row.
    let key = key_of(tuning, nearest);
    let count = match state {
        LockState::Locking {
            key: previous,
            count,
            ..
        } if *previous == key => count + 1,
        _ => 1,
    };
    if count >= hold_frames {
        (LockState::Locked { displayed: nearest }, nearest)
    } else {
        (
            LockState::Locking {
                displayed,
                key,
                count,
            },
            displayed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::StringPitch;

    const HOLD: u32 = 5;

    fn two_string_tuning() -> Tuning {
        Tuning {
            key: "test",
            name: "Test",
            strings: vec![
                StringPitch::new("E", 2, "low"),
                StringPitch::new("A", 2, "high"),
            ],
        }
    }

    #[test]
    fn empty_tuning_resolves_to_none() {
        let empty = Tuning {
            key: "empty",
            name: "Empty",
            strings: vec![],
        };
        let mut resolver = NoteResolver::new(HOLD);
        assert!(resolver.resolve(110.0, &empty).is_none());
    }

    #[test]
    fn first_match_commits_immediately() {
        let tuning = two_string_tuning();
        let mut resolver = NoteResolver::new(HOLD);
        let resolved = resolver.resolve(82.4, &tuning).unwrap();
        assert_eq!(resolved.pitch.note, "E");
        assert_eq!(*resolver.state(), LockState::Locked { displayed: 0 });
    }

    #[test]
    fn alternating_matches_never_switch_the_display() {
        let tuning = two_string_tuning();
        let mut resolver = NoteResolver::new(HOLD);
        resolver.resolve(82.41, &tuning).unwrap();

        // Alternate between the two strings; the challenger count never
        // reaches the hold depth, so E keeps the display throughout.
        for _ in 0..10 {
            let challenged = resolver.resolve(110.0, &tuning).unwrap();
            assert_eq!(challenged.pitch.note, "E");
            let settled = resolver.resolve(82.41, &tuning).unwrap();
            assert_eq!(settled.pitch.note, "E");
        }
    }

    #[test]
    fn persistent_challenger_switches_exactly_once() {
        let tuning = two_string_tuning();
        let mut resolver = NoteResolver::new(HOLD);
        resolver.resolve(82.41, &tuning).unwrap();

        let mut switches = 0;
        let mut previous = "E";
        for frame in 1..=10 {
            let resolved = resolver.resolve(110.0, &tuning).unwrap();
            if resolved.pitch.note != previous {
                switches += 1;
                previous = resolved.pitch.note;
            }
            if frame < HOLD {
                assert_eq!(resolved.pitch.note, "E", "switched early at frame {frame}");
            } else {
                assert_eq!(resolved.pitch.note, "A");
            }
        }
        assert_eq!(switches, 1);
    }

    #[test]
    fn equidistant_tie_prefers_first_in_order() {
        let tuning = Tuning {
            key: "tie",
            name: "Tie",
            strings: vec![
                StringPitch {
                    note: "X",
                    octave: 1,
                    frequency: 100.0,
                    label: "first",
                },
                StringPitch {
                    note: "Y",
                    octave: 1,
                    frequency: 300.0,
                    label: "second",
                },
            ],
        };
        let mut resolver = NoteResolver::new(HOLD);
        let resolved = resolver.resolve(200.0, &tuning).unwrap();
        assert_eq!(resolved.pitch.note, "X");
    }

    #[test]
    fn stickiness_guard_holds_near_the_midpoint() {
        // Two targets 60 cents apart; 448.5 Hz is nearer the second but not
        // better by the required margin, so the displayed note holds no
        // matter how many frames arrive.
        let tuning = Tuning {
            key: "close",
            name: "Close",
            strings: vec![
                StringPitch {
                    note: "A",
                    octave: 4,
                    frequency: 440.0,
                    label: "first",
                },
                StringPitch {
                    note: "B",
                    octave: 4,
                    frequency: 455.4,
                    label: "second",
                },
            ],
        };
        let mut resolver = NoteResolver::new(HOLD);
        resolver.resolve(440.0, &tuning).unwrap();

        for _ in 0..20 {
            let resolved = resolver.resolve(448.5, &tuning).unwrap();
            assert_eq!(resolved.pitch.note, "A");
            assert_eq!(*resolver.state(), LockState::Locked { displayed: 0 });
        }

        // Dead on the second target the guard no longer applies, and the
        // hold counter takes over.
        for frame in 1..HOLD {
            let resolved = resolver.resolve(455.4, &tuning).unwrap();
            assert_eq!(resolved.pitch.note, "A", "switched early at frame {frame}");
        }
        let resolved = resolver.resolve(455.4, &tuning).unwrap();
        assert_eq!(resolved.pitch.note, "B");
    }

    #[test]
    fn deviation_is_reported_against_the_displayed_note() {
        let tuning = two_string_tuning();
        let mut resolver = NoteResolver::new(HOLD);
        resolver.resolve(82.41, &tuning).unwrap();

        // While A2 challenges, the reading stays consistent with the E2
        // label on screen.
        let resolved = resolver.resolve(110.0, &tuning).unwrap();
        assert_eq!(resolved.pitch.note, "E");
        let expected = cents_deviation(110.0, resolved.pitch.frequency);
        assert!((resolved.cents - expected).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_the_display() {
        let tuning = two_string_tuning();
        let mut resolver = NoteResolver::new(HOLD);
        resolver.resolve(82.41, &tuning).unwrap();
        resolver.reset();
        assert_eq!(*resolver.state(), LockState::Unlocked);

        // After the reset the next frame commits immediately again.
        let resolved = resolver.resolve(110.0, &tuning).unwrap();
        assert_eq!(resolved.pitch.note, "A");
    }
}
