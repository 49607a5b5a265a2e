use super::types::{CaptureParameters, Control, ExposureControl, FaceDetectMode, FlashMode, SceneMode};
use crate::camera::CameraCapabilities;
use crate::error::ParameterError;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Latest-value store for every user-tunable capture parameter.
///
/// Writers may be on any thread; readers either take a [`snapshot`](Self::snapshot)
/// or [`subscribe`](Self::subscribe) to be woken on change. Intermediate values
/// are dropped when a subscriber is slower than the writers.
pub struct ParameterStore {
    sender: watch::Sender<CaptureParameters>,
    capabilities: RwLock<Option<Arc<CameraCapabilities>>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::with_parameters(CaptureParameters::default())
    }

    pub fn with_parameters(initial: CaptureParameters) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            capabilities: RwLock::new(None),
        }
    }

    pub fn snapshot(&self) -> CaptureParameters {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureParameters> {
        self.sender.subscribe()
    }

    pub fn is_af_auto(&self) -> bool {
        self.snapshot().is_af_auto()
    }

    pub fn is_ae_auto(&self) -> bool {
        self.snapshot().is_ae_auto()
    }

    pub fn is_awb_auto(&self) -> bool {
        self.snapshot().is_awb_auto()
    }

    /// Set the exposure time cell. A manual value is only accepted while AE is
    /// already manual; `Auto` returns the whole AE family to automatic.
    pub fn set_exposure_time(&self, value: Control<u64>) -> Result<(), ParameterError> {
        let caps = self.capabilities.read().clone();
        let mut result = Ok(());
        self.update(|params| match (value, params.exposure) {
            (Control::Auto, _) => params.exposure = ExposureControl::Auto,
            (Control::Manual(_), ExposureControl::Auto) => {
                result = Err(ParameterError::PartialManualExposure {
                    field: "exposure_time",
                });
            }
            (Control::Manual(time), ExposureControl::Manual { iso, .. }) => {
                params.exposure = ExposureControl::Manual {
                    exposure_time_ns: clamp_exposure_time(caps.as_deref(), time),
                    iso,
                };
            }
        });
        result
    }

    /// Set the ISO cell with the same rules as [`set_exposure_time`](Self::set_exposure_time)
    pub fn set_sensitivity(&self, value: Control<u32>) -> Result<(), ParameterError> {
        let caps = self.capabilities.read().clone();
        let mut result = Ok(());
        self.update(|params| match (value, params.exposure) {
            (Control::Auto, _) => params.exposure = ExposureControl::Auto,
            (Control::Manual(_), ExposureControl::Auto) => {
                result = Err(ParameterError::PartialManualExposure {
                    field: "sensitivity",
                });
            }
            (
                Control::Manual(iso),
                ExposureControl::Manual {
                    exposure_time_ns, ..
                },
            ) => {
                params.exposure = ExposureControl::Manual {
                    exposure_time_ns,
                    iso: clamp_sensitivity(caps.as_deref(), iso),
                };
            }
        });
        result
    }

    /// Switch AE to manual with both fields in one write
    pub fn set_manual_exposure(&self, exposure_time_ns: u64, iso: u32) {
        let caps = self.capabilities.read().clone();
        self.update(|params| {
            params.exposure = ExposureControl::Manual {
                exposure_time_ns: clamp_exposure_time(caps.as_deref(), exposure_time_ns),
                iso: clamp_sensitivity(caps.as_deref(), iso),
            };
        });
    }

    pub fn set_ae_auto(&self) {
        self.update(|params| params.exposure = ExposureControl::Auto);
    }

    pub fn set_focal_distance(&self, value: Control<f32>) -> Result<(), ParameterError> {
        let value = match value {
            Control::Manual(diopters) => {
                ensure_finite("focal_distance", diopters)?;
                let range = self
                    .capabilities
                    .read()
                    .as_ref()
                    .and_then(|caps| caps.focal_distance_range());
                Control::Manual(range.map_or(diopters, |r| r.clamp(diopters)))
            }
            Control::Auto => Control::Auto,
        };
        self.update(|params| params.focal_distance = value);
        Ok(())
    }

    pub fn set_af_auto(&self) {
        self.update(|params| params.focal_distance = Control::Auto);
    }

    pub fn set_white_balance(&self, value: Control<f32>) -> Result<(), ParameterError> {
        if let Control::Manual(factor) = value {
            ensure_finite("white_balance", factor)?;
        }
        self.update(|params| params.white_balance = value);
        Ok(())
    }

    pub fn set_awb_auto(&self) {
        self.update(|params| params.white_balance = Control::Auto);
    }

    pub fn set_ae_compensation(&self, value: i32) {
        let range = self
            .capabilities
            .read()
            .as_ref()
            .and_then(|caps| caps.ae_compensation_range);
        let value = range.map_or(value, |r| r.clamp(value));
        self.update(|params| params.ae_compensation = value);
    }

    pub fn set_zoom_ratio(&self, value: f32) -> Result<(), ParameterError> {
        ensure_finite("zoom_ratio", value)?;
        let range = self
            .capabilities
            .read()
            .as_ref()
            .and_then(|caps| caps.zoom_ratio_range);
        let value = range.map_or(value, |r| r.clamp(value));
        self.update(|params| params.zoom_ratio = value);
        Ok(())
    }

    pub fn set_scene_mode(&self, value: Option<SceneMode>) {
        self.update(|params| params.scene_mode = value);
    }

    pub fn set_face_detect_mode(&self, value: Option<FaceDetectMode>) {
        self.update(|params| params.face_detect_mode = value);
    }

    pub fn set_optical_stabilization(&self, enabled: bool) {
        self.update(|params| params.optical_stabilization = enabled);
    }

    pub fn set_flash_mode(&self, mode: FlashMode) {
        self.update(|params| params.flash_mode = mode);
    }

    /// Fit the stored values to a newly bound camera
    pub fn apply_capabilities(&self, caps: Arc<CameraCapabilities>) {
        info!(
            "Applying capabilities for {:?} camera (zoom {:?}, OIS {})",
            caps.lens_facing, caps.zoom_ratio_range, caps.ois_available
        );

        self.update(|params| {
            if let Some(range) = caps.zoom_ratio_range {
                params.zoom_ratio = range.clamp(params.zoom_ratio);
            }
            if let Some(range) = caps.ae_compensation_range {
                params.ae_compensation = range.clamp(params.ae_compensation);
            }
            params.focal_distance = match (params.focal_distance, caps.focal_distance_range()) {
                (Control::Manual(d), Some(range)) => Control::Manual(range.clamp(d)),
                // Fixed-focus lens: nothing to drive manually
                (Control::Manual(_), None) => Control::Auto,
                (Control::Auto, _) => Control::Auto,
            };
            if let ExposureControl::Manual {
                exposure_time_ns,
                iso,
            } = params.exposure
            {
                params.exposure = ExposureControl::Manual {
                    exposure_time_ns: clamp_exposure_time(Some(caps.as_ref()), exposure_time_ns),
                    iso: clamp_sensitivity(Some(caps.as_ref()), iso),
                };
            }
            params.optical_stabilization = caps.ois_available;
            params.face_detect_mode = caps.best_face_detect_mode();
            if let Some(mode) = params.scene_mode {
                if !caps.scene_modes.contains(&mode) {
                    params.scene_mode = None;
                }
            }
        });

        *self.capabilities.write() = Some(caps);
    }

    fn update<F>(&self, modify: F)
    where
        F: FnOnce(&mut CaptureParameters),
    {
        self.sender.send_if_modified(|params| {
            let before = *params;
            modify(params);
            let changed = before != *params;
            if changed {
                debug!("Capture parameters updated: {:?}", params);
            }
            changed
        });
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_finite(field: &'static str, value: f32) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { field, value })
    }
}

fn clamp_exposure_time(caps: Option<&CameraCapabilities>, value: u64) -> u64 {
    caps.and_then(|caps| caps.exposure_time_range)
        .map_or(value, |range| range.clamp(value))
}

fn clamp_sensitivity(caps: Option<&CameraCapabilities>, value: u32) -> u32 {
    caps.and_then(|caps| caps.sensitivity_range)
        .map_or(value, |range| range.clamp(value))
}
