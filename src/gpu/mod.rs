//! GPU side of the galaxy: vertex sync, sprite rendering and the camera
//!
//! The simulation runs on the CPU. Each frame the particle store is packed
//! into a vertex buffer (see [`GpuSync`]) and drawn as glowing point
//! sprites with additive blending (see [`SpriteRenderer`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nbody_galaxy::galaxy::generate_default;
//! use nbody_galaxy::gpu::{GpuParticleBuffer, GpuSync, OffscreenTarget, SpriteRenderer};
//!
//! let (device, queue) = pollster::block_on(create_render_device())?;
//! let (device, queue) = (Arc::new(device), Arc::new(queue));
//!
//! let store = generate_default(3000);
//! let mut particles = GpuParticleBuffer::from_store(device.clone(), queue.clone(), &store);
//! GpuSync::default().sync(&store, &mut particles)?;
//! ```
//!
//! # Vertex layout
//!
//! One 24-byte record per particle, in store order: position `vec3<f32>`
//! at location 0 followed by color `vec3<f32>` at location 1. Records are
//! stepped per instance; the shader expands each one into a quad.

pub mod camera;
mod render_shaders;
mod renderer;
mod sync;
mod types;

pub use camera::Camera3D;
pub use render_shaders::sprite_shader;
pub use renderer::{OFFSCREEN_FORMAT, OffscreenTarget, SpriteRenderer, create_render_device};
pub use sync::{GpuParticleBuffer, GpuSync, VertexMirror, VertexTarget};
pub use types::{
    // Default constants for customization
    COLOR_LOCATION,
    DEFAULT_CLEAR_COLOR,
    DEFAULT_HEIGHT,
    DEFAULT_POINT_SIZE,
    DEFAULT_REFERENCE_DISTANCE,
    DEFAULT_WIDTH,
    POSITION_LOCATION,
    ParticleVertex,
    RenderConfig,
    SpriteUniforms,
};
