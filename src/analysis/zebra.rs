use image::{GrayImage, Rgba, RgbaImage};

pub const ZEBRA_COLOR: Rgba<u8> = Rgba([0, 255, 255, 255]);

/// Marching diagonal stripes over over-exposed pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZebraPattern {
    threshold: u8,
    stripe_width: u32,
    offset: u32,
}

impl ZebraPattern {
    pub fn new(threshold: u8, stripe_width: u32) -> Self {
        Self {
            threshold,
            stripe_width: stripe_width.max(1),
            offset: 0,
        }
    }

    /// Distance between consecutive stripes
    pub fn period(&self) -> u32 {
        self.stripe_width * 3
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Step the pattern one pixel; wraps to zero once past a full period
    pub fn advance(&mut self) {
        self.offset += 1;
        if self.offset > self.period() {
            self.offset = 0;
        }
    }

    /// Whether `(x, y)` lies on a stripe at the current offset
    pub fn on_stripe(&self, x: u32, y: u32) -> bool {
        let period = self.period() as u64;
        let half = (self.stripe_width / 2) as u64;
        let diagonal = x as u64 + y as u64 + half + period - self.offset as u64 % period;
        diagonal % period < self.stripe_width as u64
    }

    /// Render the mask for one frame, then advance the offset
    pub fn render(&mut self, luma: &GrayImage) -> RgbaImage {
        let mask = RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
            if luma.get_pixel(x, y).0[0] > self.threshold && self.on_stripe(x, y) {
                ZEBRA_COLOR
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        self.advance();
        mask
    }
}
