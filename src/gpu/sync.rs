//! CPU to GPU particle synchronization
//!
//! The [`ParticleStore`] is the source of truth. Every frame its position and
//! color fields are packed in store order and written over the whole vertex
//! buffer. The buffer is never read back into the store.
//!
//! A target's particle capacity is fixed when it is created. Syncing a store
//! of a different length is a configuration error: nothing is written, and
//! the caller gets [`SimError::BufferMismatch`].

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::error::{SimError, SimResult};
use crate::gpu::types::ParticleVertex;
use crate::particle::ParticleStore;

/// Somewhere packed particle vertices can be written.
pub trait VertexTarget {
    /// Number of particles the target holds
    fn capacity(&self) -> usize;

    /// Replace the entire contents. `vertices.len()` equals `capacity()`.
    fn write_vertices(&mut self, vertices: &[ParticleVertex]);
}

/// Packs a store into a reusable scratch buffer and uploads it.
#[derive(Debug, Default)]
pub struct GpuSync {
    scratch: Vec<ParticleVertex>,
}

impl GpuSync {
    /// Create a sync layer with scratch space for `capacity` particles
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Overwrite `target` with the current store state.
    pub fn sync<T: VertexTarget + ?Sized>(
        &mut self,
        store: &ParticleStore,
        target: &mut T,
    ) -> SimResult<()> {
        if store.len() != target.capacity() {
            return Err(SimError::BufferMismatch {
                capacity: target.capacity(),
                store: store.len(),
            });
        }

        store.write_vertices(&mut self.scratch);
        target.write_vertices(&self.scratch);
        Ok(())
    }
}

/// A CPU-side mirror of the vertex buffer.
///
/// Used where no GPU is present (headless runs, tests); holds exactly what a
/// GPU buffer of the same capacity would.
#[derive(Debug, Clone)]
pub struct VertexMirror {
    vertices: Vec<ParticleVertex>,
}

impl VertexMirror {
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: vec![ParticleVertex::default(); capacity],
        }
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    /// Raw bytes, exactly as they would sit in GPU memory
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl VertexTarget for VertexMirror {
    fn capacity(&self) -> usize {
        self.vertices.len()
    }

    fn write_vertices(&mut self, vertices: &[ParticleVertex]) {
        self.vertices.copy_from_slice(vertices);
    }
}

/// GPU-resident vertex buffer sized for a fixed particle count.
pub struct GpuParticleBuffer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    buffer: wgpu::Buffer,
    count: usize,
}

impl GpuParticleBuffer {
    /// Allocate an empty buffer for `count` particles
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, count: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Vertex Buffer"),
            size: Self::byte_size(count),
            usage: Self::usage(),
            mapped_at_creation: false,
        });

        Self {
            device,
            queue,
            buffer,
            count,
        }
    }

    /// Allocate a buffer initialized from `store`, sized to its length
    pub fn from_store(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        store: &ParticleStore,
    ) -> Self {
        if store.is_empty() {
            return Self::new(device, queue, 0);
        }

        let vertices = store.vertices();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: Self::usage(),
        });

        Self {
            device,
            queue,
            buffer,
            count: store.len(),
        }
    }

    fn usage() -> wgpu::BufferUsages {
        wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC
    }

    // Zero-sized buffers cannot be bound, keep room for one record
    fn byte_size(count: usize) -> u64 {
        (count.max(1) * std::mem::size_of::<ParticleVertex>()) as u64
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Copy the buffer back to the CPU. Blocks until the GPU is idle.
    pub fn read_back(&self) -> SimResult<Vec<ParticleVertex>> {
        if self.count == 0 {
            return Ok(Vec::new());
        }

        let size = Self::byte_size(self.count);
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Read Particles Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| SimError::Readback(e.to_string()))?
            .map_err(|e| SimError::Readback(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let vertices: Vec<ParticleVertex> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging_buffer.unmap();

        Ok(vertices)
    }
}

impl VertexTarget for GpuParticleBuffer {
    fn capacity(&self) -> usize {
        self.count
    }

    fn write_vertices(&mut self, vertices: &[ParticleVertex]) {
        if vertices.is_empty() {
            return;
        }
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(vertices));
    }
}
