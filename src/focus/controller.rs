use super::drift::{Orientation, OrientationDriftMonitor};
use super::region::NormalizedRect;
use super::trigger::{FocusState, FocusTrigger, FocusTriggerCell};
use crate::config::FocusConfig;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::info;

/// Focus intent entry point: the trigger slot plus the drift auto-cancel
pub struct FocusController {
    cell: FocusTriggerCell,
    drift: Mutex<OrientationDriftMonitor>,
    last_orientation: Mutex<Option<Orientation>>,
}

impl FocusController {
    pub fn new(config: &FocusConfig) -> Self {
        Self {
            cell: FocusTriggerCell::new(),
            drift: Mutex::new(OrientationDriftMonitor::new(
                config.drift_degrees,
                Duration::from_millis(config.drift_grace_ms),
            )),
            last_orientation: Mutex::new(None),
        }
    }

    /// Tap-to-focus. The drift monitor anchors on the last observed attitude,
    /// or on the first one to arrive when none has been seen yet.
    pub fn request_focus(&self, region: Option<NormalizedRect>, now: Instant) -> FocusTrigger {
        let trigger = self.cell.request_focus(region);
        let mut drift = self.drift.lock();
        match *self.last_orientation.lock() {
            Some(orientation) => drift.arm(orientation, now),
            None => drift.arm_on_next_sample(now),
        }
        info!("Focus requested (region {:?})", region);
        trigger
    }

    pub fn request_cancel(&self) -> FocusTrigger {
        self.drift.lock().disarm();
        info!("Focus cancel requested");
        self.cell.request_cancel()
    }

    /// Feed an attitude sample; returns true when it auto-cancelled focus
    pub fn observe_orientation(&self, orientation: Orientation, now: Instant) -> bool {
        *self.last_orientation.lock() = Some(orientation);
        let fired = self.drift.lock().observe(orientation, now);
        if fired {
            self.cell.request_cancel();
        }
        fired
    }

    pub fn current(&self) -> Option<FocusTrigger> {
        self.cell.current()
    }

    pub fn state(&self) -> FocusState {
        self.cell.state()
    }

    pub fn consume(&self, generation: u64) -> bool {
        self.cell.consume(generation)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cell.subscribe()
    }
}
