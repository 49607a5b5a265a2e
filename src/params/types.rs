use serde::{Deserialize, Serialize};

/// A tunable that is either left to the hardware or pinned to a value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Control<T> {
    Auto,
    Manual(T),
}

impl<T: Copy> Control<T> {
    pub fn is_auto(&self) -> bool {
        matches!(self, Control::Auto)
    }

    pub fn manual(&self) -> Option<T> {
        match self {
            Control::Auto => None,
            Control::Manual(value) => Some(*value),
        }
    }
}

impl<T> Default for Control<T> {
    fn default() -> Self {
        Control::Auto
    }
}

/// Exposure time and ISO are manual together or not at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExposureControl {
    #[default]
    Auto,
    Manual { exposure_time_ns: u64, iso: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMode {
    #[default]
    Off,
    Auto,
    On,
    AlwaysOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    FacePriority,
    Action,
    Portrait,
    Landscape,
    Night,
    NightPortrait,
    Theatre,
    Beach,
    Snow,
    Sunset,
    SteadyPhoto,
    Fireworks,
    Sports,
    Party,
    Candlelight,
    Barcode,
    HighSpeedVideo,
    Hdr,
}

impl SceneMode {
    pub const ALL: [SceneMode; 18] = [
        SceneMode::FacePriority,
        SceneMode::Action,
        SceneMode::Portrait,
        SceneMode::Landscape,
        SceneMode::Night,
        SceneMode::NightPortrait,
        SceneMode::Theatre,
        SceneMode::Beach,
        SceneMode::Snow,
        SceneMode::Sunset,
        SceneMode::SteadyPhoto,
        SceneMode::Fireworks,
        SceneMode::Sports,
        SceneMode::Party,
        SceneMode::Candlelight,
        SceneMode::Barcode,
        SceneMode::HighSpeedVideo,
        SceneMode::Hdr,
    ];

    /// Hardware control code
    pub fn code(&self) -> u8 {
        match self {
            SceneMode::FacePriority => 1,
            SceneMode::Action => 2,
            SceneMode::Portrait => 3,
            SceneMode::Landscape => 4,
            SceneMode::Night => 5,
            SceneMode::NightPortrait => 6,
            SceneMode::Theatre => 7,
            SceneMode::Beach => 8,
            SceneMode::Snow => 9,
            SceneMode::Sunset => 10,
            SceneMode::SteadyPhoto => 11,
            SceneMode::Fireworks => 12,
            SceneMode::Sports => 13,
            SceneMode::Party => 14,
            SceneMode::Candlelight => 15,
            SceneMode::Barcode => 16,
            SceneMode::HighSpeedVideo => 17,
            SceneMode::Hdr => 18,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceDetectMode {
    Off,
    Simple,
    Full,
}

impl FaceDetectMode {
    pub fn code(&self) -> u8 {
        match self {
            FaceDetectMode::Off => 0,
            FaceDetectMode::Simple => 1,
            FaceDetectMode::Full => 2,
        }
    }
}

/// Snapshot of every user-tunable capture setting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureParameters {
    pub exposure: ExposureControl,
    /// Lens focus distance in diopters
    pub focal_distance: Control<f32>,
    /// White-balance factor fed to the RGGB gain formula
    pub white_balance: Control<f32>,
    pub ae_compensation: i32,
    pub zoom_ratio: f32,
    pub scene_mode: Option<SceneMode>,
    pub face_detect_mode: Option<FaceDetectMode>,
    /// Requested optical stabilisation; only honoured when the camera has it
    pub optical_stabilization: bool,
    pub flash_mode: FlashMode,
}

impl CaptureParameters {
    pub fn is_af_auto(&self) -> bool {
        self.focal_distance.is_auto()
    }

    pub fn is_ae_auto(&self) -> bool {
        self.exposure == ExposureControl::Auto
    }

    pub fn is_awb_auto(&self) -> bool {
        self.white_balance.is_auto()
    }

    pub fn exposure_time_ns(&self) -> Control<u64> {
        match self.exposure {
            ExposureControl::Auto => Control::Auto,
            ExposureControl::Manual {
                exposure_time_ns, ..
            } => Control::Manual(exposure_time_ns),
        }
    }

    pub fn sensitivity(&self) -> Control<u32> {
        match self.exposure {
            ExposureControl::Auto => Control::Auto,
            ExposureControl::Manual { iso, .. } => Control::Manual(iso),
        }
    }
}

impl Default for CaptureParameters {
    fn default() -> Self {
        Self {
            exposure: ExposureControl::Auto,
            focal_distance: Control::Auto,
            white_balance: Control::Auto,
            ae_compensation: 0,
            zoom_ratio: 1.0,
            scene_mode: None,
            face_detect_mode: None,
            optical_stabilization: false,
            flash_mode: FlashMode::Off,
        }
    }
}
