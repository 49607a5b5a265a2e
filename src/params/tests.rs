use super::*;
use crate::camera::mock::{back_camera_capabilities, front_camera_capabilities};
use crate::error::ParameterError;
use std::sync::Arc;

#[test]
fn test_defaults_are_fully_automatic() {
    let store = ParameterStore::new();
    assert!(store.is_af_auto());
    assert!(store.is_ae_auto());
    assert!(store.is_awb_auto());
    assert_eq!(store.snapshot().ae_compensation, 0);
    assert_eq!(store.snapshot().flash_mode, FlashMode::Off);
}

#[test]
fn test_partial_manual_exposure_is_rejected() {
    let store = ParameterStore::new();

    let err = store.set_sensitivity(Control::Manual(400)).unwrap_err();
    assert_eq!(
        err,
        ParameterError::PartialManualExposure {
            field: "sensitivity"
        }
    );
    assert!(store.set_exposure_time(Control::Manual(1_000_000)).is_err());

    // The rejected writes left AE untouched
    assert!(store.is_ae_auto());
    assert_eq!(store.snapshot().exposure, ExposureControl::Auto);
}

#[test]
fn test_manual_exposure_fields_update_independently_once_manual() {
    let store = ParameterStore::new();
    store.set_manual_exposure(10_000_000, 200);
    assert!(!store.is_ae_auto());

    store.set_sensitivity(Control::Manual(800)).unwrap();
    store.set_exposure_time(Control::Manual(20_000_000)).unwrap();

    let params = store.snapshot();
    assert_eq!(params.sensitivity(), Control::Manual(800));
    assert_eq!(params.exposure_time_ns(), Control::Manual(20_000_000));
}

#[test]
fn test_auto_on_either_field_resets_whole_family() {
    let store = ParameterStore::new();
    store.set_manual_exposure(10_000_000, 200);

    store.set_sensitivity(Control::Auto).unwrap();
    let params = store.snapshot();
    assert!(params.is_ae_auto());
    assert_eq!(params.exposure_time_ns(), Control::Auto);
    assert_eq!(params.sensitivity(), Control::Auto);
}

#[test]
fn test_af_and_awb_classification() {
    let store = ParameterStore::new();
    store.set_focal_distance(Control::Manual(2.5)).unwrap();
    store.set_white_balance(Control::Manual(50.0)).unwrap();
    assert!(!store.is_af_auto());
    assert!(!store.is_awb_auto());

    store.set_af_auto();
    store.set_awb_auto();
    assert!(store.is_af_auto());
    assert!(store.is_awb_auto());
}

#[test]
fn test_non_finite_values_are_rejected() {
    let store = ParameterStore::new();
    assert!(matches!(
        store.set_focal_distance(Control::Manual(f32::NAN)),
        Err(ParameterError::NonFinite { field: "focal_distance", .. })
    ));
    assert!(store.set_zoom_ratio(f32::INFINITY).is_err());
    assert!(store.set_white_balance(Control::Manual(f32::NAN)).is_err());
    assert_eq!(store.snapshot(), CaptureParameters::default());
}

#[test]
fn test_apply_capabilities_clamps_and_enables_features() {
    let store = ParameterStore::new();
    store.set_zoom_ratio(50.0).unwrap();
    store.set_focal_distance(Control::Manual(30.0)).unwrap();
    store.set_ae_compensation(99);
    store.set_manual_exposure(u64::MAX, 1);

    let caps = Arc::new(back_camera_capabilities());
    store.apply_capabilities(caps.clone());

    let params = store.snapshot();
    let zoom = caps.zoom_ratio_range.unwrap();
    assert_eq!(params.zoom_ratio, zoom.upper);
    assert_eq!(
        params.focal_distance,
        Control::Manual(caps.minimum_focus_distance.unwrap())
    );
    assert_eq!(params.ae_compensation, caps.ae_compensation_range.unwrap().upper);
    assert_eq!(
        params.exposure,
        ExposureControl::Manual {
            exposure_time_ns: caps.exposure_time_range.unwrap().upper,
            iso: caps.sensitivity_range.unwrap().lower,
        }
    );
    assert!(params.optical_stabilization);
    assert_eq!(params.face_detect_mode, Some(FaceDetectMode::Full));

    // Later writes are clamped against the bound camera
    store.set_zoom_ratio(0.01).unwrap();
    assert_eq!(store.snapshot().zoom_ratio, zoom.lower);
}

#[test]
fn test_apply_capabilities_without_ois_or_focus_motor() {
    let store = ParameterStore::new();
    store.set_optical_stabilization(true);
    store.set_focal_distance(Control::Manual(1.0)).unwrap();

    store.apply_capabilities(Arc::new(front_camera_capabilities()));

    let params = store.snapshot();
    assert!(!params.optical_stabilization);
    assert!(params.is_af_auto());
}

#[tokio::test]
async fn test_subscribers_observe_latest_value_only() {
    let store = ParameterStore::new();
    let mut rx = store.subscribe();

    store.set_ae_compensation(1);
    store.set_ae_compensation(2);
    store.set_ae_compensation(3);

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().ae_compensation, 3);
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn test_identical_write_does_not_notify() {
    let store = ParameterStore::new();
    let rx = store.subscribe();
    store.set_flash_mode(FlashMode::Off);
    assert!(!rx.has_changed().unwrap());
    store.set_flash_mode(FlashMode::Auto);
    assert!(rx.has_changed().unwrap());
}

#[test]
fn test_scene_mode_codes() {
    assert_eq!(SceneMode::FacePriority.code(), 1);
    assert_eq!(SceneMode::Hdr.code(), 18);
    assert_eq!(SceneMode::from_code(5), Some(SceneMode::Night));
    assert_eq!(SceneMode::from_code(0), None);
}
