//! Frequency stream smoothing.
//!
//! Raw per-frame estimates jitter and occasionally jump a whole octave for a
//! single frame while a plucked string settles. A short median filter rejects
//! those single-frame outliers before exponential smoothing removes the
//! residual jitter; either stage alone handles only one of the two problems.

use std::collections::VecDeque;

/// Valid estimates kept for the median stage.
const HISTORY_LEN: usize = 5;

/// Default exponential smoothing factor (lower = smoother, more lag).
pub const DEFAULT_ALPHA: f32 = 0.2;

/// Median-then-exponential smoother over a stream of optional estimates.
#[derive(Debug, Clone)]
pub struct FrequencySmoother {
    history: VecDeque<f32>,
    smoothed: Option<f32>,
    alpha: f32,
}

impl FrequencySmoother {
    /// Creates a smoother with the given exponential factor.
    pub fn new(alpha: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_LEN),
            smoothed: None,
            alpha,
        }
    }

    /// Feeds one frame's estimate and returns the current smoothed value.
    ///
    /// An absent estimate holds the carried value; missed frames never enter
    /// the smoothing math.
    pub fn update(&mut self, estimate: Option<f32>) -> Option<f32> {
        let Some(freq) = estimate else {
            return self.smoothed;
        };

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(freq);

        let mut sorted: Vec<f32> = self.history.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        // Lower-middle element on even lengths.
        let median = sorted[(sorted.len() - 1) / 2];

        let next = match self.smoothed {
            Some(previous) => self.alpha * median + (1.0 - self.alpha) * previous,
            None => median,
        };
        self.smoothed = Some(next);
        self.smoothed
    }

    /// The carried smoothed value, if any estimate has been seen.
    pub fn value(&self) -> Option<f32> {
        self.smoothed
    }

    /// Clears history and carried value for a fresh session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.smoothed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_to_first_median() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        assert_eq!(smoother.update(Some(200.0)), Some(200.0));
    }

    #[test]
    fn median_suppresses_single_outlier() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        for _ in 0..4 {
            smoother.update(Some(100.0));
        }
        // History is now [100, 100, 100, 100, 500]; the median stays 100, so
        // the outlier never reaches the exponential stage.
        let after_outlier = smoother.update(Some(500.0)).unwrap();
        assert!((after_outlier - 100.0).abs() < 1e-6);

        // Plain exponential smoothing would have moved a long way toward 500.
        let ema_only = DEFAULT_ALPHA * 500.0 + (1.0 - DEFAULT_ALPHA) * 100.0;
        assert!((ema_only - after_outlier).abs() > 50.0);

        let recovered = smoother.update(Some(100.0)).unwrap();
        assert!((recovered - 100.0).abs() < 1e-6);
    }

    #[test]
    fn absent_input_holds_last_value() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        smoother.update(Some(110.0));
        assert_eq!(smoother.update(None), Some(110.0));
        assert_eq!(smoother.update(None), Some(110.0));
        // The held value is the smoothing seed when signal returns.
        assert_eq!(smoother.update(Some(110.0)), Some(110.0));
    }

    #[test]
    fn absent_input_with_no_history_stays_absent() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        assert_eq!(smoother.update(None), None);
    }

    #[test]
    fn even_history_uses_lower_middle() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        smoother.update(Some(100.0));
        // History [100, 300]: lower-middle median is 100, so the value holds.
        let value = smoother.update(Some(300.0)).unwrap();
        assert!((value - 100.0).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_carried_value() {
        let mut smoother = FrequencySmoother::new(DEFAULT_ALPHA);
        smoother.update(Some(110.0));
        smoother.reset();
        assert_eq!(smoother.value(), None);
        assert_eq!(smoother.update(None), None);
    }

    #[test]
    fn history_caps_at_five() {
        let mut smoother = FrequencySmoother::new(1.0);
        for _ in 0..5 {
            smoother.update(Some(100.0));
        }
        // With alpha = 1 the output is the median itself. After three more
        // frames of 200 the window is [100, 100, 200, 200, 200].
        smoother.update(Some(200.0));
        smoother.update(Some(200.0));
        let value = smoother.update(Some(200.0)).unwrap();
        assert!((value - 200.0).abs() < 1e-6);
    }
}
