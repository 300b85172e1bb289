//! Line-list vertices for debug geometry.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

pub const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// One end of a debug line segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Vertices for a `LineList` draw, two per segment. Rebuilt every frame.
#[derive(Debug, Default, Clone)]
pub struct LineBatch {
    pub vertices: Vec<LineVertex>,
}

impl LineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn push_line(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        self.vertices.push(LineVertex::new(a, color));
        self.vertices.push(LineVertex::new(b, color));
    }

    pub fn line_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Raw bytes for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_vertex_size() {
        let layout = LineVertex::layout();
        assert_eq!(layout.array_stride, 28);
        assert_eq!(layout.attributes.len(), 2);
    }

    #[test]
    fn batch_counts_segments() {
        let mut batch = LineBatch::new();
        batch.push_line(Vec3::ZERO, Vec3::X, YELLOW);
        batch.push_line(Vec3::ZERO, Vec3::Y, YELLOW);
        assert_eq!(batch.line_count(), 2);
        assert_eq!(batch.as_bytes().len(), 4 * 28);
        batch.clear();
        assert_eq!(batch.line_count(), 0);
    }
}
