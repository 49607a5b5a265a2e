use super::mock::{back_camera_capabilities, front_camera_capabilities};
use super::*;
use crate::request::{CaptureRequest, RequestTemplate};
use std::sync::Arc;

fn identity(id: &str, caps: CameraCapabilities) -> CameraIdentity {
    CameraIdentity::new(id, caps)
}

#[test]
fn test_default_camera_prefers_back_facing() {
    let cameras = vec![
        identity("1", front_camera_capabilities()),
        identity("0", back_camera_capabilities()),
    ];
    let chosen = choose_default_camera(&cameras, LensFacing::Back).unwrap();
    assert_eq!(chosen.id, "0");
}

#[test]
fn test_default_camera_falls_back_to_first() {
    let cameras = vec![identity("7", front_camera_capabilities())];
    let chosen = choose_default_camera(&cameras, LensFacing::Back).unwrap();
    assert_eq!(chosen.id, "7");
    assert!(choose_default_camera(&[], LensFacing::Back).is_none());
}

#[test]
fn test_find_best_size_respects_max_width() {
    let sizes = [
        Size::new(1920, 1080),
        Size::new(1280, 720),
        Size::new(640, 480),
    ];
    assert_eq!(find_best_size(&sizes, None), Some(Size::new(1920, 1080)));
    assert_eq!(find_best_size(&sizes, Some(1280)), Some(Size::new(1280, 720)));
    assert_eq!(find_best_size(&sizes, Some(100)), None);
}

#[test]
fn test_sizes_by_aspect_ratio_uses_tolerance() {
    let sizes = [
        Size::new(1280, 960),
        Size::new(1280, 720),
        Size::new(1440, 1080),
    ];
    let four_three = sizes_by_aspect_ratio(&sizes, 4.0 / 3.0, 0.1);
    assert_eq!(four_three, vec![Size::new(1280, 960), Size::new(1440, 1080)]);
}

#[test]
fn test_supported_outputs_in_preference_order() {
    let caps = back_camera_capabilities();
    let outputs = caps.supported_outputs(0.1);
    let formats: Vec<_> = outputs.iter().map(|item| item.format).collect();
    assert_eq!(formats, vec![OutputFormat::Jpeg, OutputFormat::RawSensor]);
    assert_eq!(outputs[0].best_size, Size::new(4000, 3000));

    let front = front_camera_capabilities();
    assert_eq!(front.supported_outputs(0.1).len(), 1);
}

#[test]
fn test_preview_size_matches_sensor_aspect_under_limit() {
    let caps = back_camera_capabilities();
    assert_eq!(caps.choose_preview_size(1280, 0.1), Some(Size::new(1280, 960)));
    assert_eq!(caps.choose_preview_size(800, 0.1), Some(Size::new(640, 480)));
}

#[test]
fn test_best_fps_range_prefers_highest_ceiling_then_widest() {
    let caps = back_camera_capabilities();
    assert_eq!(caps.find_best_fps_range(), Some(ValueRange::new(7, 30)));
}

#[test]
fn test_focal_distance_range() {
    let back = back_camera_capabilities();
    assert_eq!(back.focal_distance_range(), Some(ValueRange::new(0.0, 10.0)));
    assert_eq!(front_camera_capabilities().focal_distance_range(), None);
}

#[test]
fn test_rotation_orientation() {
    assert_eq!(rotation_orientation(90, 0, LensFacing::Back), 90);
    assert_eq!(rotation_orientation(90, 90, LensFacing::Back), 0);
    assert_eq!(rotation_orientation(90, 270, LensFacing::Back), 180);
    assert_eq!(rotation_orientation(270, 90, LensFacing::Front), 0);
    assert_eq!(rotation_orientation(270, 0, LensFacing::Front), 270);
}

#[test]
fn test_output_format_extensions() {
    assert_eq!(OutputFormat::Jpeg.extension(), Some("JPEG"));
    assert_eq!(OutputFormat::Heic.extension(), Some("HEIC"));
    assert_eq!(OutputFormat::RawSensor.extension(), Some("DNG"));
    assert_eq!(OutputFormat::Yuv420.extension(), None);
}

#[tokio::test]
async fn test_mock_provider_records_requests_and_lifecycle() {
    let provider = MockCameraProvider::with_default_cameras();
    assert_eq!(provider.cameras().len(), 2);
    assert!(provider.open("9").await.is_err());

    let device = provider.open("0").await.unwrap();
    let results = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = results.clone();
    let callback: ResultCallback = Arc::new(move |result| sink.lock().push(result));

    let outputs = [OutputSurface {
        kind: SurfaceKind::StillImage,
        format: OutputFormat::Jpeg,
        size: Size::new(4000, 3000),
    }];
    let configured = device.create_session(&outputs, callback).await.unwrap();
    let reader = configured.still_reader.clone().unwrap();

    let request = CaptureRequest::new(RequestTemplate::StillCapture, vec![SurfaceKind::StillImage]);
    let (image, result) = tokio::join!(reader.next_image(), configured.session.capture(request));
    let image = image.unwrap();
    let result = result.unwrap();

    assert_eq!(image.format, OutputFormat::Jpeg);
    assert_eq!(&image.data[..2], &[0xFF, 0xD8]);
    assert!(result.is_3a_complete());
    assert_eq!(results.lock().len(), 1);
    assert_eq!(provider.issued_requests().len(), 1);

    reader.close();
    configured.session.close();
    device.close();
    assert_eq!(
        provider.lifecycle(),
        vec!["open:0", "configure:0", "close-reader:0", "close-session:0", "close-device:0"]
    );
}

#[tokio::test]
async fn test_mock_injected_configure_failure_is_one_shot() {
    let provider = MockCameraProvider::with_default_cameras();
    let device = provider.open("0").await.unwrap();
    let callback: ResultCallback = Arc::new(|_| {});

    provider.fail_next_configure();
    assert!(device.create_session(&[], callback.clone()).await.is_err());
    assert!(device.create_session(&[], callback).await.is_ok());
}

#[test]
fn test_3a_completion() {
    let mut result = CaptureResult {
        tag: None,
        frame_number: 0,
        timestamp_ns: 0,
        ae_state: AeState::Converged,
        af_state: AfState::FocusedLocked,
        awb_state: AwbState::Converged,
        exposure_time_ns: None,
        sensitivity: None,
        focus_distance: None,
    };
    assert!(result.is_3a_complete());

    result.af_state = AfState::ActiveScan;
    assert!(!result.is_3a_complete());

    result.af_state = AfState::NotFocusedLocked;
    result.ae_state = AeState::FlashRequired;
    assert!(result.is_3a_complete());
    assert!(result.flash_required());
}
