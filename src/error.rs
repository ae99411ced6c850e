//! Error types shared by the simulation, GPU and application layers
//!
//! The simulation core itself cannot fail on finite input. Everything here
//! is either configuration, a graphics collaborator failure, or the fatal
//! buffer/particle-count mismatch raised by the GPU sync layer.

use thiserror::Error;

/// Errors that can occur while configuring, syncing or presenting
#[derive(Error, Debug)]
pub enum SimError {
    /// The GPU vertex buffer was sized for a different particle count
    #[error("vertex buffer holds {capacity} particles but the store has {store}")]
    BufferMismatch { capacity: usize, store: usize },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML configuration could not be parsed
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A summary could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No GPU adapter matched the request
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The adapter refused to create a device
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// GPU memory could not be read back
    #[error("GPU readback failed: {0}")]
    Readback(String),

    /// The window surface could not be created
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// The adapter offers no usable surface format
    #[error("window surface is not supported by the GPU adapter")]
    UnsupportedSurface,

    /// A frame could not be acquired from the surface
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// The event loop failed to start or run
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created
    #[error("window creation failed: {0}")]
    Os(#[from] winit::error::OsError),
}

/// Result type for fallible simulation and rendering operations
pub type SimResult<T> = Result<T, SimError>;
