use super::*;
use crate::camera::mock::front_camera_capabilities;
use crate::camera::{rotation_orientation, CameraIdentity, LensFacing, MockCameraProvider};
use crate::config::RawcamConfig;
use crate::render::{texture_vertices, FrameRenderer, RenderInput};
use crate::session::SessionState;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_config(dir: &Path) -> RawcamConfig {
    let mut config = RawcamConfig::default();
    config.capture.path = dir.display().to_string();
    config.analysis.zebra = true;
    config.analysis.focus_peaking = true;
    config
}

#[derive(Default)]
struct RecordingRenderer {
    inputs: parking_lot::Mutex<Vec<RenderInput>>,
}

#[async_trait]
impl FrameRenderer for RecordingRenderer {
    async fn render(&self, input: RenderInput) -> crate::error::Result<()> {
        self.inputs.lock().push(input);
        Ok(())
    }
}

fn quick_options(frames: u64, capture: bool) -> RunOptions {
    RunOptions {
        frames: Some(frames),
        capture,
        frame_interval: Duration::from_millis(5),
        frame_size: (64, 48),
    }
}

#[tokio::test]
async fn test_app_creation() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(MockCameraProvider::with_default_cameras());
    let mut app = RawcamApp::new(
        create_test_config(dir.path()),
        provider,
        RunOptions::default(),
    )
    .await
    .unwrap();

    assert!(app.get_all_component_states().await.is_empty());
    app.initialize().await.unwrap();

    let states = app.get_all_component_states().await;
    assert_eq!(states.len(), 4);
    assert!(states.values().all(|s| *s == ComponentState::Stopped));
    assert_eq!(app.coordinator().cameras().len(), 2);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.analysis.zebra_stripe_width = 0;

    let result = RawcamApp::new(
        config,
        Arc::new(MockCameraProvider::with_default_cameras()),
        RunOptions::default(),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_start_fails_without_cameras() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(MockCameraProvider::new(Vec::<CameraIdentity>::new()));
    let mut app = RawcamApp::new(create_test_config(dir.path()), provider, quick_options(3, false))
        .await
        .unwrap();
    app.initialize().await.unwrap();

    tokio::time::pause();
    assert!(app.start().await.is_err());
    assert_eq!(
        app.get_component_state("session").await,
        Some(ComponentState::Failed)
    );
}

#[tokio::test]
async fn test_frame_budget_run_captures_and_shuts_down() {
    let dir = TempDir::new().unwrap();
    let provider = MockCameraProvider::with_default_cameras();
    let mut app = RawcamApp::new(
        create_test_config(dir.path()),
        Arc::new(provider.clone()),
        quick_options(6, true),
    )
    .await
    .unwrap();

    app.initialize().await.unwrap();
    app.start().await.unwrap();
    assert_eq!(
        app.get_component_state("session").await,
        Some(ComponentState::Running)
    );

    let exit_code = tokio::time::timeout(Duration::from_secs(10), app.run())
        .await
        .expect("run did not finish")
        .unwrap();
    assert_eq!(exit_code, 0);

    let states = app.get_all_component_states().await;
    assert!(states.values().all(|s| *s == ComponentState::Stopped));
    assert_eq!(app.coordinator().state(), SessionState::Closed);
    assert!(app.analysis_worker().frames_processed() > 0);

    let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(
        provider.lifecycle().last().map(String::as_str),
        Some("close-device:0")
    );
}

#[tokio::test]
async fn test_analysis_output_reaches_renderer_with_camera_layout() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.camera.preferred_facing = LensFacing::Front;

    let renderer = Arc::new(RecordingRenderer::default());
    let mut app = RawcamApp::new(
        config,
        Arc::new(MockCameraProvider::with_default_cameras()),
        quick_options(12, false),
    )
    .await
    .unwrap()
    .with_renderer(renderer.clone(), Some("mono".to_string()));

    app.initialize().await.unwrap();
    app.start().await.unwrap();
    assert_eq!(
        app.get_component_state("render").await,
        Some(ComponentState::Running)
    );

    let exit_code = tokio::time::timeout(Duration::from_secs(10), app.run())
        .await
        .expect("run did not finish")
        .unwrap();
    assert_eq!(exit_code, 0);
    assert_eq!(
        app.get_component_state("render").await,
        Some(ComponentState::Stopped)
    );

    let front_orientation = rotation_orientation(
        front_camera_capabilities().sensor_orientation,
        0,
        LensFacing::Front,
    );
    let inputs = renderer.inputs.lock();
    assert!(!inputs.is_empty());
    for input in inputs.iter() {
        assert_eq!(input.vertices, texture_vertices(front_orientation, true));
        assert_eq!(input.filter.as_deref(), Some("mono"));
        assert_eq!((input.frame.width, input.frame.height), (64, 48));
        // The clipped block always carries zebra stripes
        assert!(input.overlay.is_some());
    }
}

#[tokio::test]
async fn test_render_component_idle_without_renderer() {
    let dir = TempDir::new().unwrap();
    let mut app = RawcamApp::new(
        create_test_config(dir.path()),
        Arc::new(MockCameraProvider::with_default_cameras()),
        quick_options(3, false),
    )
    .await
    .unwrap();

    app.initialize().await.unwrap();
    app.start().await.unwrap();
    assert_eq!(
        app.get_component_state("render").await,
        Some(ComponentState::Stopped)
    );
    app.shutdown().await.unwrap();
}

#[test]
fn test_synthetic_frame_has_clipped_block() {
    let frame = synthetic_frame(30, 30, 3).unwrap();
    let luma = frame.luma().unwrap();
    assert_eq!(luma.get_pixel(15, 15).0[0], 255);
    assert!(luma.get_pixel(0, 0).0[0] < 255);
    assert!(synthetic_frame(0, 10, 0).is_err());
}
