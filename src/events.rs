use crate::camera::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events published by the capture pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawcamEvent {
    /// A camera was chosen as the current identity
    CameraSelected { camera_id: String },
    /// The device handle for a camera was opened
    CameraOpened {
        camera_id: String,
        timestamp: SystemTime,
    },
    /// Reader, session and device were closed
    CameraClosed { camera_id: String },
    /// The hardware reported the device as gone
    CameraDisconnected {
        camera_id: String,
        timestamp: SystemTime,
    },
    /// A capture session was configured against the still and preview outputs
    SessionConfigured {
        camera_id: String,
        output_format: Option<OutputFormat>,
        preview_size: (u32, u32),
    },
    /// The steady-state repeating request was replaced
    RepeatingRequestIssued { camera_id: String },
    /// A trigger burst was fired
    FocusTriggerIssued {
        camera_id: String,
        tag: String,
        cancel: bool,
    },
    /// The focus target was dropped because the device moved
    FocusAutoCancelled { timestamp: SystemTime },
    /// A still image reached the sink
    CaptureCompleted {
        path: PathBuf,
        format: OutputFormat,
    },
    /// A still capture failed
    CaptureFailed { error: String },
    /// A system error occurred in a component
    SystemError { component: String, error: String },
}

impl RawcamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            RawcamEvent::CameraSelected { camera_id } => {
                format!("Camera {} selected", camera_id)
            }
            RawcamEvent::CameraOpened { camera_id, .. } => {
                format!("Camera {} opened", camera_id)
            }
            RawcamEvent::CameraClosed { camera_id } => format!("Camera {} closed", camera_id),
            RawcamEvent::CameraDisconnected { camera_id, .. } => {
                format!("Camera {} disconnected", camera_id)
            }
            RawcamEvent::SessionConfigured {
                camera_id,
                output_format,
                preview_size,
            } => format!(
                "Session configured on camera {} (output {:?}, preview {}x{})",
                camera_id, output_format, preview_size.0, preview_size.1
            ),
            RawcamEvent::RepeatingRequestIssued { camera_id } => {
                format!("Repeating request issued on camera {}", camera_id)
            }
            RawcamEvent::FocusTriggerIssued {
                camera_id,
                tag,
                cancel,
            } => format!(
                "{} trigger {} issued on camera {}",
                if *cancel { "Cancel" } else { "Focus" },
                tag,
                camera_id
            ),
            RawcamEvent::FocusAutoCancelled { .. } => {
                "Focus cancelled after device movement".to_string()
            }
            RawcamEvent::CaptureCompleted { path, format } => {
                format!("Captured {:?} to {}", format, path.display())
            }
            RawcamEvent::CaptureFailed { error } => format!("Capture failed: {}", error),
            RawcamEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            RawcamEvent::CameraSelected { .. } => "camera_selected",
            RawcamEvent::CameraOpened { .. } => "camera_opened",
            RawcamEvent::CameraClosed { .. } => "camera_closed",
            RawcamEvent::CameraDisconnected { .. } => "camera_disconnected",
            RawcamEvent::SessionConfigured { .. } => "session_configured",
            RawcamEvent::RepeatingRequestIssued { .. } => "repeating_request_issued",
            RawcamEvent::FocusTriggerIssued { .. } => "focus_trigger_issued",
            RawcamEvent::FocusAutoCancelled { .. } => "focus_auto_cancelled",
            RawcamEvent::CaptureCompleted { .. } => "capture_completed",
            RawcamEvent::CaptureFailed { .. } => "capture_failed",
            RawcamEvent::SystemError { .. } => "system_error",
        }
    }
}

/// Async event bus for component coordination using broadcast channels
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RawcamEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<RawcamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers; returns the number of receivers
    pub fn publish(&self, event: RawcamEvent) -> usize {
        match &event {
            RawcamEvent::CameraOpened { camera_id, .. } => {
                info!("Camera {} opened", camera_id);
            }
            RawcamEvent::CameraDisconnected { camera_id, .. } => {
                warn!("Camera {} disconnected", camera_id);
            }
            RawcamEvent::CaptureFailed { error } => {
                warn!("Capture failed: {}", error);
            }
            RawcamEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            _ => debug!("Event: {}", event.description()),
        }

        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Event dropped, no subscribers");
                0
            }
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let delivered = bus.publish(RawcamEvent::CameraSelected {
            camera_id: "0".to_string(),
        });
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "camera_selected");
        assert_eq!(event.description(), "Camera 0 selected");
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            bus.publish(RawcamEvent::CaptureFailed {
                error: "boom".to_string()
            }),
            0
        );
    }
}
