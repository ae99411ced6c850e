//! GPU buffer types for particle rendering
//!
//! These types are designed to be uploaded directly to GPU buffers.
//! All use f32 for GPU compatibility and are repr(C) for predictable layout.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

// =============================================================================
// Default Constants
// =============================================================================

/// Default window width in pixels
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default window height in pixels
pub const DEFAULT_HEIGHT: u32 = 720;

/// Default base point-sprite size in pixels
pub const DEFAULT_POINT_SIZE: f32 = 6.0;

/// Camera distance at which sprites are drawn at their base size
pub const DEFAULT_REFERENCE_DISTANCE: f32 = 18.0;

/// Deep space background
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Vertex attribute slot for particle position
pub const POSITION_LOCATION: u32 = 0;

/// Vertex attribute slot for particle color
pub const COLOR_LOCATION: u32 = 1;

/// One particle as seen by the GPU.
///
/// Six consecutive floats: position then color, 24 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// World-space position
    pub position: [f32; 3],
    /// RGB color
    pub color: [f32; 3],
}

impl ParticleVertex {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// Per-instance vertex layout: position at slot 0, color at slot 1
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: POSITION_LOCATION,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: COLOR_LOCATION,
            },
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Uniforms for the point-sprite shader.
///
/// Layout matches WGSL struct for uniform binding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteUniforms {
    /// Combined projection * view * model matrix (column-major)
    pub mvp: [[f32; 4]; 4],
    /// Camera position in world space
    pub camera_pos: [f32; 3],
    /// Base sprite size in pixels
    pub point_size: f32,
    /// Render target size in pixels
    pub viewport: [f32; 2],
    /// Camera distance at which sprites have their base size
    pub reference_distance: f32,
    /// Padding for 16-byte alignment
    pub _padding: f32,
}

impl Default for SpriteUniforms {
    fn default() -> Self {
        Self {
            mvp: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            camera_pos: [0.0, 0.0, 0.0],
            point_size: DEFAULT_POINT_SIZE,
            viewport: [DEFAULT_WIDTH as f32, DEFAULT_HEIGHT as f32],
            reference_distance: DEFAULT_REFERENCE_DISTANCE,
            _padding: 0.0,
        }
    }
}

/// Configuration for the window and sprite renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Render target width in pixels
    pub width: u32,
    /// Render target height in pixels
    pub height: u32,
    /// Background clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Base sprite size in pixels
    pub point_size: f32,
    /// Wait for vertical sync when presenting
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            clear_color: DEFAULT_CLEAR_COLOR,
            point_size: DEFAULT_POINT_SIZE,
            vsync: true,
        }
    }
}

impl RenderConfig {
    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.clear_color[0] as f64,
            g: self.clear_color[1] as f64,
            b: self.clear_color[2] as f64,
            a: self.clear_color[3] as f64,
        }
    }
}
