use std::time::Duration;

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
    /// The synthetic frame budget ran out
    Completed,
}

/// What the demo run does once the pipeline is up
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stop after this many synthetic frames; run until signalled when unset
    pub frames: Option<u64>,
    /// Take a still once the frame budget is spent
    pub capture: bool,
    pub frame_interval: Duration,
    pub frame_size: (u32, u32),
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: None,
            capture: false,
            frame_interval: Duration::from_millis(33),
            frame_size: (320, 240),
        }
    }
}
