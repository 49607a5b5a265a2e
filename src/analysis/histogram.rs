use image::GrayImage;

pub const HISTOGRAM_BINS: usize = 256;

/// Luma intensity distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [f32; HISTOGRAM_BINS],
}

impl Histogram {
    pub fn from_luma(luma: &GrayImage) -> Self {
        let mut bins = [0f32; HISTOGRAM_BINS];
        for pixel in luma.pixels() {
            bins[pixel.0[0] as usize] += 1.0;
        }
        Self { bins }
    }

    pub fn bins(&self) -> &[f32; HISTOGRAM_BINS] {
        &self.bins
    }

    /// Tallest bin
    pub fn peak(&self) -> f32 {
        self.bins.iter().copied().fold(0.0, f32::max)
    }

    /// Bins scaled into `0.0..=1.0` for display. An empty histogram stays at zero.
    pub fn normalized(&self) -> [f32; HISTOGRAM_BINS] {
        let scale = self.peak().max(1.0);
        self.bins.map(|count| count / scale)
    }
}
