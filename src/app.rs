//! Windowed viewer
//!
//! Opens a window, owns the GPU objects and runs one frame per redraw:
//! `advance → upload uniforms → draw → present`. Mouse drag orbits the
//! camera, the wheel zooms, `R` resets the view and Escape quits.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::frame::FrameDriver;
use crate::gpu::{Camera3D, GpuParticleBuffer, RenderConfig, SpriteRenderer};
use crate::particle::ParticleStore;

const WINDOW_TITLE: &str = "N-Body Galaxy";

/// Orbit speed in radians per pixel of mouse drag
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Zoom steps per pixel of touchpad scroll
const PIXEL_SCROLL_SCALE: f32 = 0.02;

/// What the event loop should do after handling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Mouse and keyboard state for camera control.
#[derive(Debug, Default)]
pub struct InputState {
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl InputState {
    /// Left button starts and ends an orbit drag
    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>, camera: &mut Camera3D) {
        if let (true, Some(last)) = (self.dragging, self.cursor) {
            let dx = (position.x - last.x) as f32;
            let dy = (position.y - last.y) as f32;
            camera.orbit(-dx * ORBIT_SENSITIVITY, dy * ORBIT_SENSITIVITY);
        }
        self.cursor = Some(position);
    }

    pub fn scroll(&mut self, delta: MouseScrollDelta, camera: &mut Camera3D) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 * PIXEL_SCROLL_SCALE,
        };
        camera.zoom(amount);
    }

    pub fn key_pressed(&mut self, key: KeyCode, camera: &mut Camera3D) -> Control {
        match key {
            KeyCode::Escape => Control::Exit,
            KeyCode::KeyR => {
                camera.reset();
                Control::Continue
            }
            _ => Control::Continue,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

/// Window-bound GPU state, created on `resumed`
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: SpriteRenderer,
    particles: GpuParticleBuffer,
}

impl Gpu {
    fn new(window: Arc<Window>, render: &RenderConfig, store: &ParticleStore) -> SimResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(SimError::NoAdapter)?;
        info!(adapter = %adapter.get_info().name, "using GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Galaxy Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        let (device, queue) = (Arc::new(device), Arc::new(queue));

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(SimError::UnsupportedSurface)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if render.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let renderer = SpriteRenderer::new(
            device.clone(),
            queue.clone(),
            format,
            RenderConfig {
                width: surface_config.width,
                height: surface_config.height,
                ..render.clone()
            },
        );
        let particles = GpuParticleBuffer::from_store(device.clone(), queue, store);

        Ok(Self {
            window,
            surface,
            device,
            surface_config,
            renderer,
            particles,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        // Minimized windows report a zero size
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.reconfigure();
        self.renderer.resize(size.width, size.height);
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }
}

/// The viewer: simulation state plus the window it draws into.
pub struct App {
    config: SimConfig,
    driver: FrameDriver,
    camera: Camera3D,
    input: InputState,
    gpu: Option<Gpu>,
    error: Option<SimError>,
}

impl App {
    pub fn new(config: SimConfig) -> Self {
        let store = config.build_store();
        info!(particles = store.len(), "generated galaxy");

        let driver = FrameDriver::new(store, config.gravity, config.max_dt, Instant::now());
        let camera = Camera3D::new(config.window.aspect());

        Self {
            config,
            driver,
            camera,
            input: InputState::default(),
            gpu: None,
            error: None,
        }
    }

    /// Record a fatal error and stop the loop
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: SimError) {
        self.error = Some(e);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if event_loop.exiting() {
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        // The driver logs sync failures itself
        if let Err(e) = self.driver.advance(Instant::now(), &mut gpu.particles) {
            self.fail(event_loop, e);
            return;
        }

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("out of GPU memory, exiting");
                self.fail(event_loop, SimError::Surface(wgpu::SurfaceError::OutOfMemory));
                return;
            }
            Err(e) => {
                debug!(error = %e, "skipping frame");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer
            .update_uniforms(&self.camera.uniforms(gpu.renderer.config()));
        gpu.renderer.render(&view, &gpu.particles);

        gpu.window.pre_present_notify();
        frame.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let gpu = event_loop
            .create_window(attributes)
            .map_err(SimError::from)
            .and_then(|window| {
                Gpu::new(Arc::new(window), &self.config.window, self.driver.store())
            });

        match gpu {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.camera
                    .set_aspect(size.width.max(1) as f32 / size.height.max(1) as f32);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                error!(error = %e, "failed to initialize graphics");
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if window_id != gpu.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if self.input.key_pressed(code, &mut self.camera) == Control::Exit {
                    info!("escape pressed");
                    event_loop.exit();
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.input.mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position, &mut self.camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.scroll(delta, &mut self.camera);
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size);
                if size.width > 0 && size.height > 0 {
                    self.camera
                        .set_aspect(size.width as f32 / size.height as f32);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!(
            frames = self.driver.frame(),
            sim_time = self.driver.sim_time(),
            "shutting down"
        );
    }
}

/// Open the viewer window and run until it is closed.
pub fn run(config: SimConfig) -> SimResult<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
