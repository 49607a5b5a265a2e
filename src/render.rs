//! Narrow interface to the preview renderer.
//!
//! The renderer receives the latest frame, the analysis overlay and the
//! texture vertex layout for the current orientation. Shader and texture
//! management live entirely on the other side of [`FrameRenderer`].

use crate::analysis::{AnalysisOutput, FrameBuffer};
use crate::error::Result;
use async_trait::async_trait;
use image::RgbaImage;
use std::sync::Arc;

/// Texture coordinates for a triangle fan: centre, then the four corners
pub type TextureVertices = [f32; 10];

pub const TEX_VERTEX_MAT_0: TextureVertices = [0.5, 0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
pub const TEX_VERTEX_MAT_90: TextureVertices = [0.5, 0.5, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
pub const TEX_VERTEX_MAT_180: TextureVertices = [0.5, 0.5, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
pub const TEX_VERTEX_MAT_270: TextureVertices = [0.5, 0.5, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl TextureRotation {
    /// Unknown angles fall back to 90°, the usual sensor mounting
    pub fn from_degrees(degrees: u32) -> Self {
        match degrees % 360 {
            0 => TextureRotation::Deg0,
            180 => TextureRotation::Deg180,
            270 => TextureRotation::Deg270,
            _ => TextureRotation::Deg90,
        }
    }

    pub fn vertices(&self) -> TextureVertices {
        match self {
            TextureRotation::Deg0 => TEX_VERTEX_MAT_0,
            TextureRotation::Deg90 => TEX_VERTEX_MAT_90,
            TextureRotation::Deg180 => TEX_VERTEX_MAT_180,
            TextureRotation::Deg270 => TEX_VERTEX_MAT_270,
        }
    }
}

/// Vertex layout for a rotation orientation, mirrored for front cameras
pub fn texture_vertices(rotation_orientation: u32, mirrored: bool) -> TextureVertices {
    let mut vertices = TextureRotation::from_degrees(rotation_orientation).vertices();
    if mirrored {
        // Swap V1 with V2 and V3 with V4
        vertices.swap(2, 4);
        vertices.swap(3, 5);
        vertices.swap(6, 8);
        vertices.swap(7, 9);
    }
    vertices
}

/// One frame's worth of renderer input
#[derive(Debug, Clone)]
pub struct RenderInput {
    pub frame: Arc<FrameBuffer>,
    pub overlay: Option<RgbaImage>,
    pub vertices: TextureVertices,
    /// Opaque colour-filter identifier understood by the renderer
    pub filter: Option<String>,
}

impl RenderInput {
    pub fn from_analysis(
        output: &AnalysisOutput,
        rotation_orientation: u32,
        mirrored: bool,
        filter: Option<String>,
    ) -> Self {
        Self {
            frame: output.frame.clone(),
            overlay: output.overlay.clone(),
            vertices: texture_vertices(rotation_orientation, mirrored),
            filter,
        }
    }
}

#[async_trait]
pub trait FrameRenderer: Send + Sync {
    async fn render(&self, input: RenderInput) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_tables() {
        assert_eq!(texture_vertices(0, false), TEX_VERTEX_MAT_0);
        assert_eq!(texture_vertices(90, false), TEX_VERTEX_MAT_90);
        assert_eq!(texture_vertices(180, false), TEX_VERTEX_MAT_180);
        assert_eq!(texture_vertices(270, false), TEX_VERTEX_MAT_270);
        assert_eq!(texture_vertices(45, false), TEX_VERTEX_MAT_90);
    }

    #[test]
    fn test_mirroring_swaps_corner_pairs() {
        assert_eq!(
            texture_vertices(90, true),
            [0.5, 0.5, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0]
        );
        // Mirroring twice is the identity
        let mut twice = texture_vertices(270, true);
        twice.swap(2, 4);
        twice.swap(3, 5);
        twice.swap(6, 8);
        twice.swap(7, 9);
        assert_eq!(twice, TEX_VERTEX_MAT_270);
    }

    #[test]
    fn test_render_input_from_analysis() {
        let frame = Arc::new(FrameBuffer::from_luma(2, 2, 5, vec![0; 4]).unwrap());
        let output = AnalysisOutput {
            sequence: 1,
            frame,
            histogram: None,
            overlay: None,
        };
        let input = RenderInput::from_analysis(&output, 270, true, Some("mono".to_string()));
        assert_eq!(input.frame.timestamp_ns, 5);
        assert_eq!(input.vertices, texture_vertices(270, true));
        assert_eq!(input.filter.as_deref(), Some("mono"));
    }
}
