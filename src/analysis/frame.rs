use crate::error::AnalysisError;
use image::GrayImage;
use std::sync::Arc;

/// Borrowed view of one plane of a reader-owned YUV_420_888 image
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// A tightly packed plane
    pub fn packed(data: &'a [u8], width: u32) -> Self {
        Self::new(data, width as usize, 1)
    }

    fn copy_packed(
        &self,
        name: &'static str,
        width: usize,
        height: usize,
    ) -> Result<Vec<u8>, AnalysisError> {
        let pixel_stride = self.pixel_stride.max(1);
        let expected = (height - 1) * self.row_stride + (width - 1) * pixel_stride + 1;
        if self.data.len() < expected || self.row_stride < (width - 1) * pixel_stride + 1 {
            return Err(AnalysisError::PlaneTooSmall {
                plane: name,
                expected,
                actual: self.data.len(),
            });
        }

        let mut packed = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = row * self.row_stride;
            if pixel_stride == 1 {
                packed.extend_from_slice(&self.data[start..start + width]);
            } else {
                packed.extend((0..width).map(|col| self.data[start + col * pixel_stride]));
            }
        }
        Ok(packed)
    }
}

/// One preview frame with its planes copied out of the reader buffer
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub timestamp_ns: u64,
    /// Full-resolution luma, tightly packed
    pub y: Arc<Vec<u8>>,
    /// Quarter-resolution chroma, tightly packed
    pub u: Arc<Vec<u8>>,
    pub v: Arc<Vec<u8>>,
}

impl FrameBuffer {
    /// Deep-copy the three planes; the source buffers may be reused as soon
    /// as this returns.
    pub fn from_planes(
        width: u32,
        height: u32,
        timestamp_ns: u64,
        y: Plane<'_>,
        u: Plane<'_>,
        v: Plane<'_>,
    ) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));

        Ok(Self {
            width,
            height,
            timestamp_ns,
            y: Arc::new(y.copy_packed("Y", w, h)?),
            u: Arc::new(u.copy_packed("U", cw, ch)?),
            v: Arc::new(v.copy_packed("V", cw, ch)?),
        })
    }

    /// Grey frame with flat chroma, used for synthetic sources
    pub fn from_luma(width: u32, height: u32, timestamp_ns: u64, luma: Vec<u8>) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(AnalysisError::PlaneTooSmall {
                plane: "Y",
                expected,
                actual: luma.len(),
            });
        }
        let chroma = (width as usize).div_ceil(2) * (height as usize).div_ceil(2);
        Ok(Self {
            width,
            height,
            timestamp_ns,
            y: Arc::new(luma),
            u: Arc::new(vec![128; chroma]),
            v: Arc::new(vec![128; chroma]),
        })
    }

    /// Single-channel luma matrix
    pub fn luma(&self) -> Result<GrayImage, AnalysisError> {
        GrayImage::from_raw(self.width, self.height, self.y.as_ref().clone()).ok_or(
            AnalysisError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )
    }
}
