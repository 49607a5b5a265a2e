use super::*;
use crate::camera::SensorRect;
use crate::config::FocusConfig;
use std::time::{Duration, Instant};

fn controller() -> FocusController {
    FocusController::new(&FocusConfig::default())
}

#[test]
fn test_trigger_lifecycle() {
    let cell = FocusTriggerCell::new();
    assert_eq!(cell.state(), FocusState::Idle);
    assert!(cell.current().is_none());

    let region = NormalizedRect::around(0.5, 0.5, 0.2);
    let trigger = cell.request_focus(Some(region));
    assert_eq!(cell.state(), FocusState::Requested(Some(region)));

    assert!(cell.consume(trigger.generation));
    assert_eq!(cell.state(), FocusState::Idle);

    // The consumed trigger keeps its tag for result matching
    let current = cell.current().unwrap();
    assert_eq!(current.tag, trigger.tag);
    assert!(!current.is_pending());
}

#[test]
fn test_newer_trigger_survives_stale_consume() {
    let cell = FocusTriggerCell::new();
    let first = cell.request_focus(None);
    let second = cell.request_cancel();
    assert!(second.generation > first.generation);
    assert_ne!(first.tag, second.tag);

    assert!(!cell.consume(first.generation));
    assert_eq!(cell.state(), FocusState::Cancelling);

    assert!(cell.consume(second.generation));
    assert_eq!(cell.state(), FocusState::Idle);
}

#[tokio::test]
async fn test_subscribers_are_woken_by_new_triggers() {
    let cell = FocusTriggerCell::new();
    let mut rx = cell.subscribe();
    let trigger = cell.request_focus(None);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), trigger.generation);
}

#[test]
fn test_drift_after_grace_cancels_exactly_once() {
    let focus = controller();
    let t0 = Instant::now();
    let level = Orientation::new(0.0, 0.0, 0.0);

    focus.observe_orientation(level, t0);
    focus.request_focus(None, t0);

    let tilted = Orientation::new(15.0, 0.0, 0.0);
    assert!(focus.observe_orientation(tilted, t0 + Duration::from_millis(2100)));
    assert_eq!(focus.state(), FocusState::Cancelling);

    assert!(!focus.observe_orientation(tilted, t0 + Duration::from_millis(2200)));
    assert!(!focus.observe_orientation(level, t0 + Duration::from_millis(5000)));
}

#[test]
fn test_drift_within_grace_is_ignored() {
    let focus = controller();
    let t0 = Instant::now();
    focus.observe_orientation(Orientation::default(), t0);
    focus.request_focus(None, t0);

    let tilted = Orientation::new(15.0, 0.0, 0.0);
    assert!(!focus.observe_orientation(tilted, t0 + Duration::from_millis(1900)));
    assert_eq!(focus.state(), FocusState::Requested(None));
}

#[test]
fn test_focus_before_first_sample_anchors_on_next_sample() {
    let focus = controller();
    let t0 = Instant::now();
    focus.request_focus(None, t0);

    let level = Orientation::new(3.0, 0.0, 0.0);
    assert!(!focus.observe_orientation(level, t0 + Duration::from_millis(100)));

    // Grace runs from the tap, drift is measured from the first sample
    let tilted = Orientation::new(18.5, 0.0, 0.0);
    assert!(!focus.observe_orientation(tilted, t0 + Duration::from_millis(1900)));
    assert!(focus.observe_orientation(tilted, t0 + Duration::from_millis(2100)));
    assert_eq!(focus.state(), FocusState::Cancelling);
}

#[test]
fn test_pending_anchor_is_cleared_by_disarm() {
    let mut monitor = OrientationDriftMonitor::new(10.0, Duration::from_secs(2));
    let t0 = Instant::now();
    monitor.arm_on_next_sample(t0);
    assert!(monitor.is_armed());

    monitor.disarm();
    assert!(!monitor.is_armed());
    assert!(!monitor.observe(Orientation::default(), t0 + Duration::from_secs(1)));
    assert!(!monitor.observe(Orientation::new(40.0, 0.0, 0.0), t0 + Duration::from_secs(3)));
}

#[test]
fn test_small_drift_does_not_cancel() {
    let mut monitor = OrientationDriftMonitor::new(10.0, Duration::from_secs(2));
    let t0 = Instant::now();
    monitor.arm(Orientation::new(10.0, 20.0, 30.0), t0);

    let later = t0 + Duration::from_secs(3);
    assert!(!monitor.observe(Orientation::new(19.0, 11.0, 39.5), later));
    assert!(monitor.observe(Orientation::new(10.0, 20.0, 41.0), later));
    assert!(!monitor.is_armed());
}

#[test]
fn test_explicit_cancel_disarms_drift() {
    let focus = controller();
    let t0 = Instant::now();
    focus.observe_orientation(Orientation::default(), t0);
    focus.request_focus(None, t0);
    focus.request_cancel();

    let tilted = Orientation::new(0.0, 45.0, 0.0);
    assert!(!focus.observe_orientation(tilted, t0 + Duration::from_secs(3)));
}

#[test]
fn test_normalized_rect_is_clamped_and_ordered() {
    let rect = NormalizedRect::new(0.9, 1.4, -0.2, 0.3);
    assert_eq!(rect, NormalizedRect::new(0.0, 0.3, 0.9, 1.0));
    assert_eq!(rect.left, 0.0);
    assert_eq!(rect.bottom, 1.0);
}

#[test]
fn test_sensor_mapping_per_rotation() {
    let array = SensorRect::new(0, 0, 4000, 3000);
    let rect = NormalizedRect::new(0.1, 0.2, 0.3, 0.4);

    assert_eq!(
        normalized_to_sensor_rect(&rect, 0, false, &array),
        SensorRect::new(400, 600, 1200, 1200)
    );
    // 90: (x, y) -> (y, 1 - x)
    assert_eq!(
        normalized_to_sensor_rect(&rect, 90, false, &array),
        SensorRect::new(800, 2100, 1600, 2700)
    );
    // 180: (x, y) -> (1 - x, 1 - y)
    assert_eq!(
        normalized_to_sensor_rect(&rect, 180, false, &array),
        SensorRect::new(2800, 1800, 3600, 2400)
    );
    // 270: (x, y) -> (1 - y, x)
    assert_eq!(
        normalized_to_sensor_rect(&rect, 270, false, &array),
        SensorRect::new(2400, 300, 3200, 900)
    );
}

#[test]
fn test_sensor_mapping_mirrors_front_camera() {
    let array = SensorRect::new(0, 0, 1000, 1000);
    let rect = NormalizedRect::new(0.0, 0.0, 0.25, 0.25);
    assert_eq!(
        normalized_to_sensor_rect(&rect, 0, true, &array),
        SensorRect::new(750, 0, 1000, 250)
    );
}

#[test]
fn test_sensor_rect_maps_back_to_preview() {
    let array = SensorRect::new(0, 0, 4000, 3000);
    let rect = NormalizedRect::new(0.25, 0.5, 0.75, 0.75);
    for rotation in [0, 90, 180, 270] {
        for mirrored in [false, true] {
            let sensor = normalized_to_sensor_rect(&rect, rotation, mirrored, &array);
            let back = sensor_to_normalized_rect(&sensor, rotation, mirrored, &array);
            assert!((back.left - rect.left).abs() < 1e-3, "rotation {}", rotation);
            assert!((back.top - rect.top).abs() < 1e-3, "rotation {}", rotation);
            assert!((back.right - rect.right).abs() < 1e-3, "rotation {}", rotation);
            assert!((back.bottom - rect.bottom).abs() < 1e-3, "rotation {}", rotation);
        }
    }
}
