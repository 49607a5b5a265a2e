use crate::camera::{LensFacing, OutputFormat};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RawcamConfig {
    pub camera: CameraConfig,
    pub analysis: AnalysisConfig,
    pub focus: FocusConfig,
    pub capture: CaptureConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Lens facing chosen at first bind
    #[serde(default = "default_preferred_facing")]
    pub preferred_facing: LensFacing,

    /// Widest preview (YUV) stream allowed
    #[serde(default = "default_preview_max_width")]
    pub preview_max_width: u32,

    /// Allowed deviation from the sensor aspect ratio when matching sizes
    #[serde(default = "default_aspect_tolerance")]
    pub aspect_tolerance: f32,

    /// Display rotation in degrees (0, 90, 180, 270)
    #[serde(default = "default_display_rotation")]
    pub display_rotation: u32,

    /// Still output format; first supported of JPEG, HEIC, RAW when unset
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Compute the 256-bin luma histogram
    #[serde(default = "default_histogram")]
    pub histogram: bool,

    /// Highlight over-exposed regions with zebra stripes
    #[serde(default = "default_zebra")]
    pub zebra: bool,

    /// Highlight in-focus edges
    #[serde(default = "default_focus_peaking")]
    pub focus_peaking: bool,

    /// Luma level above which a pixel counts as over-exposed
    #[serde(default = "default_zebra_threshold")]
    pub zebra_threshold: u8,

    /// Stripe width in pixels; stripes repeat every three widths
    #[serde(default = "default_zebra_stripe_width")]
    pub zebra_stripe_width: u32,

    /// Normalised gradient level below which edges are dropped
    #[serde(default = "default_peaking_threshold")]
    pub peaking_threshold: u8,

    /// Window used for frame-rate accounting
    #[serde(default = "default_frame_rate_window_ms")]
    pub frame_rate_window_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FocusConfig {
    /// Pitch/roll/yaw change that invalidates a tap-to-focus target
    #[serde(default = "default_drift_degrees")]
    pub drift_degrees: f32,

    /// Time after a focus request during which drift is ignored
    #[serde(default = "default_drift_grace_ms")]
    pub drift_grace_ms: u64,

    /// Upper bound on waiting for 3A convergence before a flash capture
    #[serde(default = "default_precapture_timeout_ms")]
    pub precapture_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Directory used by the default naming policy
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// File name prefix used by the default naming policy
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl RawcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("rawcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.preferred_facing", "back")?
            .set_default("camera.preview_max_width", default_preview_max_width())?
            .set_default("camera.aspect_tolerance", default_aspect_tolerance() as f64)?
            .set_default("camera.display_rotation", default_display_rotation())?
            .set_default("analysis.histogram", default_histogram())?
            .set_default("analysis.zebra", default_zebra())?
            .set_default("analysis.focus_peaking", default_focus_peaking())?
            .set_default("analysis.zebra_threshold", default_zebra_threshold() as i64)?
            .set_default(
                "analysis.zebra_stripe_width",
                default_zebra_stripe_width() as i64,
            )?
            .set_default(
                "analysis.peaking_threshold",
                default_peaking_threshold() as i64,
            )?
            .set_default(
                "analysis.frame_rate_window_ms",
                default_frame_rate_window_ms() as i64,
            )?
            .set_default("focus.drift_degrees", default_drift_degrees() as f64)?
            .set_default("focus.drift_grace_ms", default_drift_grace_ms() as i64)?
            .set_default(
                "focus.precapture_timeout_ms",
                default_precapture_timeout_ms() as i64,
            )?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.file_prefix", default_file_prefix())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(environment_overrides())
            .build()?;

        let config: RawcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.preview_max_width == 0 {
            return Err(ConfigError::Message(
                "Preview max width must be greater than 0".to_string(),
            ));
        }

        if !self.camera.aspect_tolerance.is_finite() || self.camera.aspect_tolerance < 0.0 {
            return Err(ConfigError::Message(
                "Aspect tolerance must be a non-negative number".to_string(),
            ));
        }

        if self.camera.display_rotation % 90 != 0 || self.camera.display_rotation >= 360 {
            return Err(ConfigError::Message(
                "Display rotation must be one of 0, 90, 180, 270".to_string(),
            ));
        }

        if self.analysis.zebra_stripe_width == 0 {
            return Err(ConfigError::Message(
                "Zebra stripe width must be greater than 0".to_string(),
            ));
        }

        if self.analysis.frame_rate_window_ms == 0 {
            return Err(ConfigError::Message(
                "Frame rate window must be greater than 0".to_string(),
            ));
        }

        if !self.focus.drift_degrees.is_finite() || self.focus.drift_degrees <= 0.0 {
            return Err(ConfigError::Message(
                "Focus drift threshold must be greater than 0".to_string(),
            ));
        }

        if self.capture.path.is_empty() {
            return Err(ConfigError::Message(
                "Capture path must not be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RawcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                preferred_facing: default_preferred_facing(),
                preview_max_width: default_preview_max_width(),
                aspect_tolerance: default_aspect_tolerance(),
                display_rotation: default_display_rotation(),
                output_format: None,
            },
            analysis: AnalysisConfig::default(),
            focus: FocusConfig::default(),
            capture: CaptureConfig {
                path: default_capture_path(),
                file_prefix: default_file_prefix(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram: default_histogram(),
            zebra: default_zebra(),
            focus_peaking: default_focus_peaking(),
            zebra_threshold: default_zebra_threshold(),
            zebra_stripe_width: default_zebra_stripe_width(),
            peaking_threshold: default_peaking_threshold(),
            frame_rate_window_ms: default_frame_rate_window_ms(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            drift_degrees: default_drift_degrees(),
            drift_grace_ms: default_drift_grace_ms(),
            precapture_timeout_ms: default_precapture_timeout_ms(),
        }
    }
}

// Default value functions
fn default_preferred_facing() -> LensFacing {
    LensFacing::Back
}
fn default_preview_max_width() -> u32 {
    1280
}
fn default_aspect_tolerance() -> f32 {
    0.1
}
fn default_display_rotation() -> u32 {
    0
}

fn default_histogram() -> bool {
    true
}
fn default_zebra() -> bool {
    false
}
fn default_focus_peaking() -> bool {
    false
}
fn default_zebra_threshold() -> u8 {
    250
}
fn default_zebra_stripe_width() -> u32 {
    8
}
fn default_peaking_threshold() -> u8 {
    100
}
fn default_frame_rate_window_ms() -> u64 {
    1000
}

fn default_drift_degrees() -> f32 {
    10.0
}
fn default_drift_grace_ms() -> u64 {
    2000
}
fn default_precapture_timeout_ms() -> u64 {
    1500
}

fn default_capture_path() -> String {
    "./captures".to_string()
}
fn default_file_prefix() -> String {
    "IMG".to_string()
}

fn default_event_bus_capacity() -> usize {
    100
}

const ENV_PREFIX: &str = "RAWCAM";
const ENV_SECTIONS: [&str; 5] = ["CAMERA", "ANALYSIS", "FOCUS", "CAPTURE", "SYSTEM"];

/// `RAWCAM_<SECTION>_<FIELD>` overrides. Field names contain underscores, so
/// the section is split off by name and the nested key reaches the `config`
/// crate with a `__` separator. `RAWCAM_<SECTION>__<FIELD>` works as well.
fn environment_overrides() -> Environment {
    let vars = std::env::vars()
        .filter_map(|(key, value)| nested_env_key(&key).map(|key| (key, value)))
        .collect::<config::Map<String, String>>();

    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(Some(vars))
}

fn nested_env_key(key: &str) -> Option<String> {
    let rest = key.strip_prefix(ENV_PREFIX)?.strip_prefix('_')?;
    ENV_SECTIONS.iter().find_map(|section| {
        let field = rest
            .strip_prefix(section)?
            .strip_prefix('_')?
            .trim_start_matches('_');
        (!field.is_empty()).then(|| format!("{}_{}__{}", ENV_PREFIX, section, field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RawcamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.preferred_facing, LensFacing::Back);
        assert_eq!(config.camera.preview_max_width, 1280);
        assert_eq!(config.focus.drift_grace_ms, 2000);
        assert_eq!(config.analysis.zebra_threshold, 250);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
preferred_facing = "front"
output_format = "raw_sensor"

[analysis]
zebra = true

[capture]
path = "/tmp/shots"
"#
        )
        .unwrap();

        let config = RawcamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.camera.preferred_facing, LensFacing::Front);
        assert_eq!(config.camera.output_format, Some(OutputFormat::RawSensor));
        assert!(config.analysis.zebra);
        assert!(config.analysis.histogram);
        assert_eq!(config.capture.path, "/tmp/shots");
        assert_eq!(config.capture.file_prefix, "IMG");
    }

    #[test]
    fn test_nested_env_keys() {
        assert_eq!(
            nested_env_key("RAWCAM_CAMERA_PREVIEW_MAX_WIDTH").as_deref(),
            Some("RAWCAM_CAMERA__PREVIEW_MAX_WIDTH")
        );
        assert_eq!(
            nested_env_key("RAWCAM_FOCUS__DRIFT_DEGREES").as_deref(),
            Some("RAWCAM_FOCUS__DRIFT_DEGREES")
        );
        assert_eq!(nested_env_key("RAWCAM_CAMERA"), None);
        assert_eq!(nested_env_key("RAWCAM_LENS_FOO"), None);
        assert_eq!(nested_env_key("HOME"), None);
    }

    #[test]
    fn test_environment_overrides_multi_word_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        std::env::set_var("RAWCAM_CAMERA_PREVIEW_MAX_WIDTH", "640");
        std::env::set_var("RAWCAM_FOCUS__DRIFT_DEGREES", "25");
        std::env::set_var("RAWCAM_ANALYSIS_ZEBRA_THRESHOLD", "240");

        let loaded = RawcamConfig::load_from_file(dir.path().join("absent.toml"));

        std::env::remove_var("RAWCAM_CAMERA_PREVIEW_MAX_WIDTH");
        std::env::remove_var("RAWCAM_FOCUS__DRIFT_DEGREES");
        std::env::remove_var("RAWCAM_ANALYSIS_ZEBRA_THRESHOLD");

        let config = loaded.unwrap();
        assert_eq!(config.camera.preview_max_width, 640);
        assert_eq!(config.focus.drift_degrees, 25.0);
        assert_eq!(config.analysis.zebra_threshold, 240);
        assert_eq!(config.camera.aspect_tolerance, 0.1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RawcamConfig::default();
        config.camera.display_rotation = 45;
        assert!(config.validate().is_err());

        config.camera.display_rotation = 270;
        assert!(config.validate().is_ok());

        config.analysis.zebra_stripe_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let config = RawcamConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[camera]"));
        assert!(text.contains("preview_max_width = 1280"));
    }
}
