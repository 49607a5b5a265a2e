use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Device attitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

impl Orientation {
    pub fn new(pitch: f32, roll: f32, yaw: f32) -> Self {
        Self { pitch, roll, yaw }
    }

    /// Largest per-axis change from `other`
    pub fn max_delta(&self, other: &Orientation) -> f32 {
        (self.pitch - other.pitch)
            .abs()
            .max((self.roll - other.roll).abs())
            .max((self.yaw - other.yaw).abs())
    }
}

/// Detects that the device moved far enough to invalidate a focus target
#[derive(Debug, Clone)]
pub struct OrientationDriftMonitor {
    threshold_degrees: f32,
    grace: Duration,
    anchor: Option<(Orientation, Instant)>,
    /// Focus was requested before any attitude sample arrived
    awaiting_sample_since: Option<Instant>,
}

impl OrientationDriftMonitor {
    pub fn new(threshold_degrees: f32, grace: Duration) -> Self {
        Self {
            threshold_degrees,
            grace,
            anchor: None,
            awaiting_sample_since: None,
        }
    }

    /// Remember the attitude at the moment focus was requested
    pub fn arm(&mut self, orientation: Orientation, at: Instant) {
        self.anchor = Some((orientation, at));
        self.awaiting_sample_since = None;
    }

    /// Arm with no attitude known yet: the next sample becomes the anchor,
    /// the grace period still runs from `at`
    pub fn arm_on_next_sample(&mut self, at: Instant) {
        self.anchor = None;
        self.awaiting_sample_since = Some(at);
    }

    pub fn disarm(&mut self) {
        self.anchor = None;
        self.awaiting_sample_since = None;
    }

    pub fn is_armed(&self) -> bool {
        self.anchor.is_some() || self.awaiting_sample_since.is_some()
    }

    /// Returns true once when the drift exceeds the threshold after the grace
    /// period; the monitor disarms itself when it fires.
    pub fn observe(&mut self, orientation: Orientation, now: Instant) -> bool {
        if let Some(requested_at) = self.awaiting_sample_since.take() {
            self.anchor = Some((orientation, requested_at));
            return false;
        }
        let Some((anchor, armed_at)) = self.anchor else {
            return false;
        };

        if now.saturating_duration_since(armed_at) <= self.grace {
            return false;
        }

        let delta = orientation.max_delta(&anchor);
        if delta > self.threshold_degrees {
            debug!(
                "Orientation drifted {:.1} degrees since focus request, cancelling",
                delta
            );
            self.anchor = None;
            return true;
        }
        false
    }
}
