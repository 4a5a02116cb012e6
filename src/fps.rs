//! Smoothed frame-rate estimation.
//!
//! Instantaneous inter-frame intervals oscillate with inference latency, so
//! the displayed rate is an exponential moving average over the interval.
//! The first update has no prior timestamp and keeps the seed derived from
//! the configured nominal target rate.

use std::time::Instant;

/// Fixed EMA weight for each new interval sample.
const SMOOTHING: f64 = 0.2;

/// Process-lifetime frame-rate state. Never reset after startup.
#[derive(Debug)]
pub struct FpsEstimator {
    interval_s: f64,
    prev: Option<Instant>,
}

impl FpsEstimator {
    /// Seed the estimate with the nominal target rate from configuration.
    pub fn new(nominal_fps: f64) -> Self {
        let interval_s = if nominal_fps > 0.0 {
            1.0 / nominal_fps
        } else {
            0.0
        };
        Self {
            interval_s,
            prev: None,
        }
    }

    /// Fold one frame timestamp into the estimate and return the smoothed
    /// rate in frames per second.
    pub fn update(&mut self, timestamp: Instant) -> f64 {
        if let Some(prev) = self.prev {
            let dt = timestamp.saturating_duration_since(prev).as_secs_f64();
            if dt > 0.0 {
                self.interval_s += SMOOTHING * (dt - self.interval_s);
            }
        }
        self.prev = Some(timestamp);
        self.rate()
    }

    /// Current smoothed rate without folding in a new sample.
    pub fn rate(&self) -> f64 {
        if self.interval_s > 0.0 {
            1.0 / self.interval_s
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_update_keeps_nominal_seed() {
        let mut fps = FpsEstimator::new(20.0);
        let rate = fps.update(Instant::now());
        assert!((rate - 20.0).abs() < 1e-9);
    }

    #[test]
    fn steady_intervals_converge_within_two_percent() {
        // Seed deliberately far from the real rate: 50 steady 50ms frames
        // must still land within 2% of 20 fps.
        let mut fps = FpsEstimator::new(8.0);
        let start = Instant::now();
        let mut rate = fps.update(start);
        for i in 1..=50u32 {
            rate = fps.update(start + Duration::from_millis(50 * u64::from(i)));
        }
        assert!((rate - 20.0).abs() / 20.0 < 0.02, "rate={}", rate);
    }

    #[test]
    fn single_stall_does_not_swing_the_estimate() {
        let mut fps = FpsEstimator::new(20.0);
        let start = Instant::now();
        fps.update(start);
        for i in 1..=20u32 {
            fps.update(start + Duration::from_millis(50 * u64::from(i)));
        }
        let settled = fps.rate();
        // One 500ms stall.
        let stalled = fps.update(start + Duration::from_millis(1500));
        assert!(stalled > settled * 0.5, "stall over-weighted: {}", stalled);
    }

    #[test]
    fn zero_nominal_rate_is_tolerated() {
        let mut fps = FpsEstimator::new(0.0);
        assert_eq!(fps.rate(), 0.0);
        let start = Instant::now();
        fps.update(start);
        let rate = fps.update(start + Duration::from_millis(100));
        assert!(rate > 0.0);
    }
}
