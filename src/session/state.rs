use crate::camera::OutputFormat;

/// Hardware lifecycle as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No device open
    Closed,
    /// A device is being opened or its session configured
    Opening { camera_id: String },
    /// Device open and a session configured
    Streaming { camera_id: String },
}

impl SessionState {
    pub fn camera_id(&self) -> Option<&str> {
        match self {
            SessionState::Closed => None,
            SessionState::Opening { camera_id } | SessionState::Streaming { camera_id } => {
                Some(camera_id)
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, SessionState::Streaming { .. })
    }
}

/// Host-driven inputs the coordinator reconciles against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleInputs {
    pub permission_granted: bool,
    pub resumed: bool,
    pub selected_camera: Option<String>,
    /// Requested still format; the first supported one is used when absent or unsupported
    pub output_format: Option<OutputFormat>,
    /// Whether the renderer has provided a preview surface
    pub preview_surface: bool,
    /// Display rotation in degrees
    pub display_rotation: u32,
}

impl LifecycleInputs {
    /// Whether the host allows a device to be open at all
    pub fn wants_open(&self) -> bool {
        self.permission_granted && self.resumed && self.selected_camera.is_some()
    }
}

impl Default for LifecycleInputs {
    fn default() -> Self {
        Self {
            permission_granted: false,
            resumed: false,
            selected_camera: None,
            output_format: None,
            preview_surface: true,
            display_rotation: 0,
        }
    }
}
