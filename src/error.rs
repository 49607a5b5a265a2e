use thiserror::Error;

#[derive(Error, Debug)]
pub enum RawcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl RawcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Rejected writes to the parameter store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Cannot set {field} manually while auto-exposure is active; set exposure time and ISO together")]
    PartialManualExposure { field: &'static str },

    #[error("Value for {field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
}

#[derive(Error, Debug, Clone)]
pub enum CameraError {
    #[error("Camera {id} not found")]
    NotFound { id: String },

    #[error("Failed to open camera {id}: {details}")]
    Open { id: String, details: String },

    #[error("Camera {id} disconnected")]
    Disconnected { id: String },

    #[error("No camera available")]
    NoCameraAvailable,
}

#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("Capture session configuration failed: {details}")]
    Configuration { details: String },

    #[error("Capture session is not streaming")]
    NotStreaming,

    #[error("Request rejected by capture session: {details}")]
    RequestRejected { details: String },

    #[error("Capture session closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Still capture failed: {details}")]
    Failed { details: String },

    #[error("Still image reader closed before an image was delivered")]
    ImageUnavailable,

    #[error("RAW capture result is missing exposure time or sensitivity")]
    MissingMetadata,

    #[error("No DNG encoder configured for RAW output")]
    RawEncoderUnavailable,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("{plane} plane too small: expected at least {expected} bytes, got {actual}")]
    PlaneTooSmall {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, RawcamError>;
