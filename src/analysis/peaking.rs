use super::overlay::premultiply_alpha;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Edge strength per pixel, normalised to the full 0..255 range with weak
/// edges (at or below `threshold`) zeroed
pub fn gradient_magnitude(luma: &GrayImage, threshold: u8) -> GrayImage {
    let gx = horizontal_sobel(luma);
    let gy = vertical_sobel(luma);

    let combined: Vec<u8> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| {
            let ax = saturate_abs(x.0[0]) as f32;
            let ay = saturate_abs(y.0[0]) as f32;
            (0.5 * ax + 0.5 * ay).round().min(255.0) as u8
        })
        .collect();

    let (min, max) = combined
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max.saturating_sub(min) as f32;

    GrayImage::from_fn(luma.width(), luma.height(), |x, y| {
        let value = combined[(y * luma.width() + x) as usize];
        let stretched = if range > 0.0 {
            ((value - min) as f32 * 255.0 / range).round() as u8
        } else {
            0
        };
        Luma([if stretched > threshold { stretched } else { 0 }])
    })
}

/// Green highlight whose alpha follows edge strength, alpha pre-multiplied
pub fn focus_peaking(luma: &GrayImage, threshold: u8) -> RgbaImage {
    let magnitude = gradient_magnitude(luma, threshold);
    let mut overlay = RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
        Rgba([0, 255, 0, magnitude.get_pixel(x, y).0[0]])
    });
    premultiply_alpha(&mut overlay);
    overlay
}

fn saturate_abs(value: i16) -> u8 {
    value.unsigned_abs().min(u8::MAX as u16) as u8
}
