use super::region::NormalizedRect;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// One-shot focus command waiting to be carried by the next request build
#[derive(Debug, Clone, PartialEq)]
pub struct FocusTrigger {
    pub region: Option<NormalizedRect>,
    pub request_focus: bool,
    pub request_cancel: bool,
    /// Increases on every write; consumption is checked against it
    pub generation: u64,
    /// Stamped on every request built while this trigger is current
    pub tag: String,
}

impl FocusTrigger {
    pub fn is_pending(&self) -> bool {
        self.request_focus || self.request_cancel
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusState {
    Idle,
    Requested(Option<NormalizedRect>),
    Cancelling,
}

/// Single pending-trigger slot: many writers, one consumer.
///
/// A newer write replaces an unconsumed trigger. The consumer passes back the
/// generation it issued so a trigger written in the meantime survives.
pub struct FocusTriggerCell {
    slot: Mutex<Option<FocusTrigger>>,
    generation: watch::Sender<u64>,
}

impl FocusTriggerCell {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            slot: Mutex::new(None),
            generation,
        }
    }

    /// Request a focus sweep, optionally metered on `region`
    pub fn request_focus(&self, region: Option<NormalizedRect>) -> FocusTrigger {
        self.write(region, true, false)
    }

    pub fn request_cancel(&self) -> FocusTrigger {
        self.write(None, false, true)
    }

    /// The current trigger, pending or already consumed
    pub fn current(&self) -> Option<FocusTrigger> {
        self.slot.lock().clone()
    }

    pub fn state(&self) -> FocusState {
        match self.slot.lock().as_ref() {
            Some(trigger) if trigger.request_cancel => FocusState::Cancelling,
            Some(trigger) if trigger.request_focus => FocusState::Requested(trigger.region),
            _ => FocusState::Idle,
        }
    }

    /// Mark the trigger issued. Returns false when a newer trigger replaced it.
    pub fn consume(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(trigger) if trigger.generation == generation => {
                trigger.request_focus = false;
                trigger.request_cancel = false;
                debug!("Focus trigger {} consumed", generation);
                true
            }
            _ => false,
        }
    }

    /// Woken on every new trigger
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn write(
        &self,
        region: Option<NormalizedRect>,
        request_focus: bool,
        request_cancel: bool,
    ) -> FocusTrigger {
        let mut slot = self.slot.lock();
        let generation = *self.generation.borrow() + 1;
        let trigger = FocusTrigger {
            region,
            request_focus,
            request_cancel,
            generation,
            tag: Uuid::new_v4().to_string(),
        };
        *slot = Some(trigger.clone());
        self.generation.send_replace(generation);
        debug!(
            "Focus trigger {} written (focus={}, cancel={})",
            generation, request_focus, request_cancel
        );
        trigger
    }
}

impl Default for FocusTriggerCell {
    fn default() -> Self {
        Self::new()
    }
}
