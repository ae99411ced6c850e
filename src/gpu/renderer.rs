//! GPU renderer for glowing particle sprites
//!
//! Provides `SpriteRenderer`, which draws every particle in a
//! [`GpuParticleBuffer`] as an additive-blended point sprite, and
//! `OffscreenTarget` for rendering without a window.

use std::sync::Arc;

use crate::error::{SimError, SimResult};
use crate::gpu::render_shaders::sprite_shader;
use crate::gpu::sync::GpuParticleBuffer;
use crate::gpu::types::{ParticleVertex, RenderConfig, SpriteUniforms};

/// Vertices per sprite quad (two triangles)
const SPRITE_VERTICES: u32 = 6;

/// Color format used for offscreen rendering
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Additive blending weighted by source alpha, so overlapping sprites glow
const GLOW_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// GPU renderer for particle point sprites.
///
/// # Example
///
/// ```ignore
/// use nbody_galaxy::gpu::{Camera3D, GpuParticleBuffer, RenderConfig, SpriteRenderer};
///
/// let renderer = SpriteRenderer::new(device.clone(), queue.clone(), format, RenderConfig::default());
/// let particles = GpuParticleBuffer::from_store(device, queue, &store);
///
/// renderer.update_uniforms(&camera.uniforms(renderer.config()));
/// renderer.render(&view, &particles);
/// ```
pub struct SpriteRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    config: RenderConfig,
}

impl SpriteRenderer {
    /// Create a renderer drawing into targets of the given color format.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
        config: RenderConfig,
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(sprite_shader().into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sprite Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sprite Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vs_sprite"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[ParticleVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fs_sprite"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(GLOW_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            // Additive sprites are order independent, no depth test
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Uniform Buffer"),
            size: std::mem::size_of::<SpriteUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let renderer = Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            config,
        };
        renderer.update_uniforms(&SpriteUniforms::default());
        renderer
    }

    /// Upload the matrix, camera position and sprite size
    pub fn update_uniforms(&self, uniforms: &SpriteUniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Clear `view` and draw every particle in `particles` as a sprite.
    pub fn render(&self, view: &wgpu::TextureView, particles: &GpuParticleBuffer) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sprite Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !particles.is_empty() {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, particles.buffer().slice(..));
                render_pass.draw(0..SPRITE_VERTICES, 0..particles.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Track a new target size (call when the window resizes)
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
    }

    /// Get the render configuration
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

/// A color texture that can be rendered to and read back.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Read back the rendered image as RGBA pixels (width × height × 4 bytes).
    ///
    /// Blocks until the GPU has finished rendering.
    pub fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> SimResult<Vec<u8>> {
        // Rows must be padded to COPY_BYTES_PER_ROW_ALIGNMENT (256)
        let unpadded_bytes_per_row = self.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pixel Staging Buffer"),
            size: (padded_bytes_per_row * self.height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| SimError::Readback(e.to_string()))?
            .map_err(|e| SimError::Readback(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();

        // Remove padding from each row
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            let start = (y * padded_bytes_per_row) as usize;
            let end = start + unpadded_bytes_per_row as usize;
            pixels.extend_from_slice(&data[start..end]);
        }

        drop(data);
        staging_buffer.unmap();

        Ok(pixels)
    }
}

/// Create a GPU device and queue without a window surface.
pub async fn create_render_device() -> SimResult<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(SimError::NoAdapter)?;

    let device = adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await?;
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::camera::Camera3D;
    use crate::particle::{Particle, ParticleStore};

    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 240;

    fn setup() -> (Arc<wgpu::Device>, Arc<wgpu::Queue>, SpriteRenderer) {
        let (device, queue) = pollster::block_on(create_render_device()).unwrap();
        let (device, queue) = (Arc::new(device), Arc::new(queue));
        let config = RenderConfig {
            width: WIDTH,
            height: HEIGHT,
            ..RenderConfig::default()
        };
        let renderer = SpriteRenderer::new(device.clone(), queue.clone(), OFFSCREEN_FORMAT, config);
        (device, queue, renderer)
    }

    fn pixel(pixels: &[u8], x: u32, y: u32) -> &[u8] {
        let i = ((y * WIDTH + x) * 4) as usize;
        &pixels[i..i + 4]
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_render_empty_scene() {
        let (device, queue, renderer) = setup();
        let target = OffscreenTarget::new(&device, WIDTH, HEIGHT);
        let particles = GpuParticleBuffer::new(device.clone(), queue.clone(), 0);

        renderer.render(target.view(), &particles);

        let pixels = target.read_pixels(&device, &queue).unwrap();
        assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);
        assert!(pixels.chunks(4).all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_render_single_particle_at_center() {
        let (device, queue, renderer) = setup();
        let target = OffscreenTarget::new(&device, WIDTH, HEIGHT);

        let store =
            ParticleStore::from_particles(vec![Particle::new([0.0, 0.0, 0.0], [1.0, 0.8, 0.2])]);
        let particles = GpuParticleBuffer::from_store(device.clone(), queue.clone(), &store);

        let camera = Camera3D::new(WIDTH as f32 / HEIGHT as f32);
        renderer.update_uniforms(&camera.uniforms(renderer.config()));
        renderer.render(target.view(), &particles);

        let pixels = target.read_pixels(&device, &queue).unwrap();
        let center = pixel(&pixels, WIDTH / 2, HEIGHT / 2);
        assert!(center[0] > 50, "expected a lit sprite at the center, got {center:?}");
        let corner = pixel(&pixels, 0, 0);
        assert_eq!(&corner[..3], &[0, 0, 0]);
    }
}
