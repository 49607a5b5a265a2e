use image::RgbaImage;

/// Scale colour channels by alpha
pub fn premultiply_alpha(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let alpha = pixel.0[3] as u16;
        for channel in &mut pixel.0[..3] {
            *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
        }
    }
}

/// Per-channel saturating sum of two equally sized overlays
pub fn composite(base: &RgbaImage, layer: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(layer.pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0.iter()) {
            *d = d.saturating_add(*s);
        }
    }
    out
}

/// Combine whichever masks were produced
pub fn combine(zebra: Option<RgbaImage>, peaking: Option<RgbaImage>) -> Option<RgbaImage> {
    match (zebra, peaking) {
        (Some(zebra), Some(peaking)) => Some(composite(&zebra, &peaking)),
        (Some(single), None) | (None, Some(single)) => Some(single),
        (None, None) => None,
    }
}
