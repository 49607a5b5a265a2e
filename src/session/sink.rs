use crate::camera::{CameraCapabilities, CaptureResult, OutputFormat, StillImage};
use crate::error::CaptureError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Chooses where a still lands; `None` discards the image
pub type SaveFilePolicy = Arc<dyn Fn(SystemTime, OutputFormat) -> Option<PathBuf> + Send + Sync>;

/// `<dir>/<prefix>_<unix-millis>.<JPEG|HEIC|DNG>`; other formats are discarded
pub fn default_save_file_policy(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> SaveFilePolicy {
    let dir = dir.into();
    let prefix = prefix.into();
    Arc::new(move |timestamp, format| {
        let extension = format.extension()?;
        let millis = DateTime::<Utc>::from(timestamp).timestamp_millis();
        Some(dir.join(format!("{}_{}.{}", prefix, millis, extension)))
    })
}

/// EXIF orientation tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl ExifOrientation {
    pub fn from_degrees(degrees: u32) -> Self {
        match degrees % 360 {
            90 => ExifOrientation::Rotate90,
            180 => ExifOrientation::Rotate180,
            270 => ExifOrientation::Rotate270,
            _ => ExifOrientation::Normal,
        }
    }

    /// Numeric value written to the EXIF orientation tag
    pub fn tag_value(&self) -> u16 {
        match self {
            ExifOrientation::Normal => 1,
            ExifOrientation::Rotate90 => 6,
            ExifOrientation::Rotate180 => 3,
            ExifOrientation::Rotate270 => 8,
        }
    }
}

/// Everything a DNG writer needs for one RAW frame
pub struct RawCapture<'a> {
    pub image: &'a StillImage,
    pub result: &'a CaptureResult,
    pub capabilities: &'a CameraCapabilities,
    pub orientation: ExifOrientation,
}

/// Encodes a RAW frame plus metadata into a DNG container
pub trait DngEncoder: Send + Sync {
    fn encode(&self, raw: &RawCapture<'_>) -> Result<Vec<u8>, CaptureError>;
}

/// Final destination for captured stills
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Write an already encoded image (JPEG, HEIC)
    async fn write_encoded(&self, data: &[u8], path: &Path) -> Result<(), CaptureError>;

    /// Write a RAW frame with its capture metadata
    async fn write_raw(&self, raw: RawCapture<'_>, path: &Path) -> Result<(), CaptureError>;
}

/// Writes stills to the local filesystem
#[derive(Clone, Default)]
pub struct FileImageSink {
    dng_encoder: Option<Arc<dyn DngEncoder>>,
}

impl FileImageSink {
    pub fn new() -> Self {
        Self { dng_encoder: None }
    }

    pub fn with_dng_encoder(mut self, encoder: Arc<dyn DngEncoder>) -> Self {
        self.dng_encoder = Some(encoder);
        self
    }

    async fn write_file(&self, data: &[u8], path: &Path) -> Result<(), CaptureError> {
        let to_error = |source| CaptureError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
        }
        tokio::fs::write(path, data).await.map_err(to_error)?;
        info!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl ImageSink for FileImageSink {
    async fn write_encoded(&self, data: &[u8], path: &Path) -> Result<(), CaptureError> {
        self.write_file(data, path).await
    }

    async fn write_raw(&self, raw: RawCapture<'_>, path: &Path) -> Result<(), CaptureError> {
        let encoder = self
            .dng_encoder
            .as_ref()
            .ok_or(CaptureError::RawEncoderUnavailable)?;
        debug!(
            "Encoding {}x{} RAW frame with orientation {:?}",
            raw.image.size.width, raw.image.size.height, raw.orientation
        );
        let data = encoder.encode(&raw)?;
        self.write_file(&data, path).await
    }
}
