mod controller;
mod drift;
mod region;
mod trigger;
#[cfg(test)]
mod tests;

pub use controller::FocusController;
pub use drift::{Orientation, OrientationDriftMonitor};
pub use region::{normalized_to_sensor_rect, sensor_to_normalized_rect, NormalizedRect};
pub use trigger::{FocusState, FocusTrigger, FocusTriggerCell};
