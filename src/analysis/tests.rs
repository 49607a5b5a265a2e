use super::*;
use crate::error::AnalysisError;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn step_edge(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn all_enabled() -> AnalysisSettings {
    AnalysisSettings {
        histogram: true,
        zebra: true,
        focus_peaking: true,
        ..AnalysisSettings::default()
    }
}

#[test]
fn test_from_planes_honours_row_and_pixel_stride() {
    // 4x2 luma with two bytes of row padding
    let y = [1, 2, 3, 4, 0, 0, 5, 6, 7, 8];
    // 2x1 chroma interleaved with a pixel stride of two
    let u = [10, 99, 30];
    let v = [20, 99, 40];

    let frame = FrameBuffer::from_planes(
        4,
        2,
        7,
        Plane::new(&y, 6, 1),
        Plane::new(&u, 4, 2),
        Plane::new(&v, 4, 2),
    )
    .unwrap();

    assert_eq!(frame.y.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(frame.u.as_slice(), &[10, 30]);
    assert_eq!(frame.v.as_slice(), &[20, 40]);
    assert_eq!(frame.timestamp_ns, 7);
}

#[test]
fn test_from_planes_deep_copies_reader_buffer() {
    let mut y = vec![42u8; 4];
    let chroma = vec![128u8; 1];
    let frame = FrameBuffer::from_planes(
        2,
        2,
        0,
        Plane::packed(&y, 2),
        Plane::packed(&chroma, 1),
        Plane::packed(&chroma, 1),
    )
    .unwrap();

    y.iter_mut().for_each(|b| *b = 0);
    assert_eq!(frame.y.as_slice(), &[42, 42, 42, 42]);
}

#[test]
fn test_from_planes_rejects_short_planes_and_empty_frames() {
    let y = [0u8; 3];
    let chroma = [0u8; 1];
    let err = FrameBuffer::from_planes(
        2,
        2,
        0,
        Plane::packed(&y, 2),
        Plane::packed(&chroma, 1),
        Plane::packed(&chroma, 1),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::PlaneTooSmall {
            plane: "Y",
            expected: 4,
            actual: 3
        }
    );

    let err = FrameBuffer::from_planes(
        0,
        2,
        0,
        Plane::packed(&y, 0),
        Plane::packed(&chroma, 1),
        Plane::packed(&chroma, 1),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidDimensions {
            width: 0,
            height: 2
        }
    );
}

#[test]
fn test_luma_matches_y_plane() {
    let frame = FrameBuffer::from_luma(3, 1, 0, vec![9, 8, 7]).unwrap();
    let luma = frame.luma().unwrap();
    assert_eq!(luma.dimensions(), (3, 1));
    assert_eq!(luma.get_pixel(2, 0).0[0], 7);
}

#[test]
fn test_histogram_counts_and_normalises() {
    let luma = GrayImage::from_raw(4, 1, vec![0, 10, 10, 255]).unwrap();
    let histogram = Histogram::from_luma(&luma);

    assert_eq!(histogram.bins()[10], 2.0);
    assert_eq!(histogram.peak(), 2.0);
    let normalized = histogram.normalized();
    assert_eq!(normalized[10], 1.0);
    assert_eq!(normalized[0], 0.5);
    assert_eq!(normalized[255], 0.5);
}

#[test]
fn test_empty_histogram_normalises_without_nan() {
    let histogram = Histogram::from_luma(&GrayImage::new(0, 0));
    assert_eq!(histogram.peak(), 0.0);
    assert!(histogram.normalized().iter().all(|v| *v == 0.0));
}

#[test]
fn test_zebra_marks_only_overexposed_stripes() {
    let mut zebra = ZebraPattern::new(250, 8);
    let bright = GrayImage::from_pixel(48, 1, Luma([255]));
    let mask = zebra.render(&bright);

    let striped: Vec<u32> = (0..48)
        .filter(|&x| *mask.get_pixel(x, 0) == ZEBRA_COLOR)
        .collect();
    assert_eq!(striped.len(), 16);
    assert!(striped.contains(&0));
    assert!(striped.contains(&20));
    assert!(!striped.contains(&10));

    let dim = GrayImage::from_pixel(48, 1, Luma([250]));
    let mask = zebra.render(&dim);
    assert!(mask.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_zebra_offset_marches_and_wraps() {
    let mut zebra = ZebraPattern::new(250, 8);
    assert_eq!(zebra.period(), 24);

    zebra.render(&GrayImage::new(4, 4));
    assert_eq!(zebra.offset(), 1);

    for _ in 1..24 {
        zebra.advance();
    }
    assert_eq!(zebra.offset(), 24);
    zebra.advance();
    assert_eq!(zebra.offset(), 0);
}

#[test]
fn test_zebra_stripes_shift_with_offset() {
    let mut zebra = ZebraPattern::new(250, 8);
    let before: Vec<bool> = (0..24).map(|x| zebra.on_stripe(x, 0)).collect();
    zebra.advance();
    let after: Vec<bool> = (0..24).map(|x| zebra.on_stripe(x, 0)).collect();

    assert_ne!(before, after);
    // Advancing by one moves every stripe one pixel along the diagonal
    assert_eq!(after[1..], before[..23]);
}

#[test]
fn test_gradient_magnitude_finds_step_edge() {
    let magnitude = gradient_magnitude(&step_edge(8, 8), 100);
    assert_eq!(magnitude.get_pixel(3, 4).0[0], 255);
    assert_eq!(magnitude.get_pixel(4, 4).0[0], 255);
    assert_eq!(magnitude.get_pixel(0, 4).0[0], 0);
    assert_eq!(magnitude.get_pixel(7, 4).0[0], 0);
}

#[test]
fn test_gradient_magnitude_of_flat_image_is_zero() {
    let magnitude = gradient_magnitude(&GrayImage::from_pixel(6, 6, Luma([77])), 100);
    assert!(magnitude.pixels().all(|p| p.0[0] == 0));
}

#[test]
fn test_focus_peaking_is_green_and_premultiplied() {
    let overlay = focus_peaking(&step_edge(8, 8), 100);
    assert_eq!(*overlay.get_pixel(3, 4), Rgba([0, 255, 0, 255]));
    assert_eq!(*overlay.get_pixel(0, 4), Rgba([0, 0, 0, 0]));
}

#[test]
fn test_premultiply_alpha() {
    let mut image = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
    premultiply_alpha(&mut image);
    assert_eq!(*image.get_pixel(0, 0), Rgba([100, 50, 25, 128]));
}

#[test]
fn test_composite_saturates() {
    let a = RgbaImage::from_pixel(1, 1, Rgba([200, 10, 0, 255]));
    let b = RgbaImage::from_pixel(1, 1, Rgba([100, 10, 0, 255]));
    assert_eq!(*composite(&a, &b).get_pixel(0, 0), Rgba([255, 20, 0, 255]));

    assert!(combine(None, None).is_none());
    assert_eq!(combine(Some(a.clone()), None), Some(a));
}

#[test]
fn test_analyzer_respects_enable_flags() {
    let frame = Arc::new(FrameBuffer::from_luma(8, 8, 0, step_edge(8, 8).into_raw()).unwrap());

    let mut analyzer = FrameAnalyzer::new(AnalysisSettings {
        histogram: false,
        zebra: false,
        focus_peaking: false,
        ..AnalysisSettings::default()
    });
    let output = analyzer.analyze(frame.clone()).unwrap();
    assert!(output.histogram.is_none());
    assert!(output.overlay.is_none());

    analyzer.set_settings(all_enabled());
    let output = analyzer.analyze(frame).unwrap();
    assert_eq!(output.sequence, 2);
    assert!(output.histogram.is_some());
    let overlay = output.overlay.unwrap();
    assert_eq!(overlay.dimensions(), (8, 8));
    // Bright side carries zebra stripes, the edge carries peaking
    assert_eq!(overlay.get_pixel(3, 4).0[1], 255);
    assert_eq!(analyzer.zebra_offset(), 1);
}

#[test]
fn test_frame_rate_meter_windows() {
    let mut meter = FrameRateMeter::new(Duration::from_secs(1));
    let start = Instant::now();
    meter.record_frame(start);
    meter.record_frame(start + Duration::from_millis(500));
    assert_eq!(meter.fps(), 0.0);
    meter.record_frame(start + Duration::from_secs(1));
    assert!((meter.fps() - 3.0).abs() < 1e-3);
    assert_eq!(meter.frames_processed, 3);

    meter.suspend();
    assert_eq!(meter.fps(), 0.0);
}

#[tokio::test]
async fn test_worker_publishes_latest_output() {
    let worker = Arc::new(AnalysisWorker::new(all_enabled(), Duration::from_secs(1)));
    let token = CancellationToken::new();
    let handle = worker.spawn(token.clone());
    let mut outputs = worker.subscribe();

    worker.submit(FrameBuffer::from_luma(8, 8, 1, step_edge(8, 8).into_raw()).unwrap());
    tokio::time::timeout(Duration::from_secs(2), outputs.wait_for(|o| o.is_some()))
        .await
        .expect("no analysis output")
        .unwrap();

    let output = worker.latest().unwrap();
    assert_eq!(output.frame.timestamp_ns, 1);
    assert!(output.histogram.is_some());
    assert_eq!(worker.frames_processed(), 1);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_paused_worker_skips_frames_until_resumed() {
    let worker = Arc::new(AnalysisWorker::new(all_enabled(), Duration::from_secs(1)));
    let token = CancellationToken::new();
    let handle = worker.spawn(token.clone());

    worker.pause();
    assert!(worker.is_paused());
    tokio::time::sleep(Duration::from_millis(50)).await;

    worker.submit(FrameBuffer::from_luma(4, 4, 1, vec![0; 16]).unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(worker.frames_processed(), 0);

    worker.resume();
    let mut outputs = worker.subscribe();
    tokio::time::timeout(Duration::from_secs(2), outputs.wait_for(|o| o.is_some()))
        .await
        .expect("frame not analysed after resume")
        .unwrap();
    assert_eq!(worker.frames_processed(), 1);

    token.cancel();
    handle.await.unwrap();
}
