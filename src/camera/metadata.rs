use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeState {
    Inactive,
    Searching,
    Converged,
    Locked,
    FlashRequired,
    Precapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AfState {
    Inactive,
    PassiveScan,
    PassiveFocused,
    ActiveScan,
    FocusedLocked,
    NotFocusedLocked,
    PassiveUnfocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AwbState {
    Inactive,
    Searching,
    Converged,
    Locked,
}

/// Per-frame metadata reported by the hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Tag of the request that produced this frame
    pub tag: Option<String>,
    pub frame_number: u64,
    pub timestamp_ns: u64,
    pub ae_state: AeState,
    pub af_state: AfState,
    pub awb_state: AwbState,
    pub exposure_time_ns: Option<u64>,
    pub sensitivity: Option<u32>,
    pub focus_distance: Option<f32>,
}

impl CaptureResult {
    /// Exposure, focus and white balance have all settled
    pub fn is_3a_complete(&self) -> bool {
        let ae = matches!(
            self.ae_state,
            AeState::Converged | AeState::Locked | AeState::FlashRequired
        );
        let af = matches!(
            self.af_state,
            AfState::FocusedLocked | AfState::NotFocusedLocked
        );
        let awb = matches!(self.awb_state, AwbState::Converged | AwbState::Locked);
        ae && af && awb
    }

    pub fn flash_required(&self) -> bool {
        self.ae_state == AeState::FlashRequired
    }
}
