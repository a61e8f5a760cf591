//! Low-frequency steps-per-second estimator.
//!
//! Sampling every step would be dominated by scheduler noise, so the estimate
//! is only recomputed once at least two seconds of wall-clock time have
//! passed; between samples the previous figure is returned unchanged. The
//! clock is threaded in as a parameter so the estimator stays deterministic
//! under test.

use instant::{Duration, Instant};

/// Minimum wall-clock time between two samples.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(2000);

/// Smoothed steps/second figure over >= 2 s windows.
#[derive(Clone, Debug)]
pub struct FrameRateEstimator {
    last_sample_time: Instant,
    last_sample_step: u32,
    rate: u32,
}

impl FrameRateEstimator {
    pub fn new(start: Instant) -> Self {
        Self {
            last_sample_time: start,
            last_sample_step: 0,
            rate: 0,
        }
    }

    /// Refreshes the estimate after a simulation step.
    ///
    /// `step` is the current step counter; `now` the current wall-clock time.
    /// Recomputes `(delta steps) / (elapsed seconds)` rounded to the nearest
    /// integer once the sample interval has elapsed, otherwise keeps the
    /// previous value.
    pub fn update(&mut self, now: Instant, step: u32) {
        let elapsed = now.saturating_duration_since(self.last_sample_time);
        if elapsed >= SAMPLE_INTERVAL {
            let steps = step.wrapping_sub(self.last_sample_step) as f32;
            self.rate = (steps / elapsed.as_secs_f32() + 0.5) as u32;
            self.last_sample_step = step;
            self.last_sample_time = now;
        }
    }

    /// The most recently computed steps/second figure.
    pub fn rate(&self) -> u32 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_below_sample_interval() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new(start);
        estimator.update(start + Duration::from_millis(500), 50);
        estimator.update(start + Duration::from_millis(1999), 199);
        assert_eq!(estimator.rate(), 0);
    }

    #[test]
    fn recomputed_after_sample_interval() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new(start);
        estimator.update(start + Duration::from_millis(2000), 200);
        assert_eq!(estimator.rate(), 100);
    }

    #[test]
    fn rate_is_rounded_to_nearest() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new(start);
        // 150 steps over 4 s is 37.5 steps/s, rounds up to 38.
        estimator.update(start + Duration::from_secs(4), 150);
        assert_eq!(estimator.rate(), 38);
    }

    #[test]
    fn window_restarts_at_each_sample() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new(start);
        estimator.update(start + Duration::from_secs(2), 200);
        assert_eq!(estimator.rate(), 100);
        // Next window only covers steps 200..300.
        estimator.update(start + Duration::from_secs(4), 300);
        assert_eq!(estimator.rate(), 50);
    }
}
