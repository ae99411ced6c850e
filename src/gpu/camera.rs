//! Orbit camera looking at the galaxy center
//!
//! Provides a camera with spherical coordinate controls (orbit, zoom)
//! and the combined projection-view-model matrix for the sprite shader.

use crate::gpu::types::{DEFAULT_REFERENCE_DISTANCE, RenderConfig, SpriteUniforms};
use std::f32::consts::{FRAC_PI_2, PI};

/// Default field of view in radians (45 degrees)
pub const DEFAULT_FOV: f32 = PI / 4.0;

/// Default near clip plane
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clip plane
pub const DEFAULT_FAR: f32 = 100.0;

/// Default camera distance from the origin
pub const DEFAULT_DISTANCE: f32 = 18.0;

/// Minimum camera distance (zoom limit)
pub const MIN_DISTANCE: f32 = 2.0;

/// Maximum camera distance (zoom limit)
pub const MAX_DISTANCE: f32 = 80.0;

/// Elevation angle limit (prevent gimbal lock)
const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// 3D camera using spherical coordinates around a target.
///
/// At the default `azimuth = 0` and `elevation = 0` the eye sits on +Z at
/// `distance`, looking at the target with +Y up.
///
/// # Example
///
/// ```
/// use nbody_galaxy::gpu::camera::Camera3D;
///
/// let mut camera = Camera3D::new(1280.0 / 720.0);
/// assert_eq!(camera.position(), [0.0, 0.0, 18.0]);
///
/// camera.orbit(0.1, 0.05);
/// camera.zoom(0.5);
///
/// let mvp = camera.mvp();
/// ```
#[derive(Debug, Clone)]
pub struct Camera3D {
    /// Distance from target (spherical radius)
    pub distance: f32,
    /// Horizontal angle in radians (0 = eye on +Z)
    pub azimuth: f32,
    /// Vertical angle in radians (0 = level)
    pub elevation: f32,
    /// Target point the camera looks at
    pub target: [f32; 3],
    /// Field of view in radians
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane distance
    pub near: f32,
    /// Far clip plane distance
    pub far: f32,
}

impl Camera3D {
    /// Create a new camera with the given aspect ratio
    pub fn new(aspect: f32) -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            azimuth: 0.0,
            elevation: 0.0,
            target: [0.0, 0.0, 0.0],
            fov: DEFAULT_FOV,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Compute camera position in world space from spherical coordinates
    pub fn position(&self) -> [f32; 3] {
        let cos_elev = self.elevation.cos();
        let sin_elev = self.elevation.sin();
        let cos_azim = self.azimuth.cos();
        let sin_azim = self.azimuth.sin();

        let x = self.distance * cos_elev * sin_azim + self.target[0];
        let y = self.distance * sin_elev + self.target[1];
        let z = self.distance * cos_elev * cos_azim + self.target[2];

        [x, y, z]
    }

    /// Compute view matrix (world -> camera space)
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        look_at(self.position(), self.target, [0.0, 1.0, 0.0])
    }

    /// Compute perspective projection matrix (camera -> clip space)
    pub fn projection_matrix(&self) -> [[f32; 4]; 4] {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined projection * view * model, with an identity model matrix
    pub fn mvp(&self) -> [[f32; 4]; 4] {
        mul(self.projection_matrix(), self.view_matrix())
    }

    /// Sprite shader uniforms for a render target described by `config`
    pub fn uniforms(&self, config: &RenderConfig) -> SpriteUniforms {
        SpriteUniforms {
            mvp: self.mvp(),
            camera_pos: self.position(),
            point_size: config.point_size,
            viewport: [config.width as f32, config.height as f32],
            reference_distance: DEFAULT_REFERENCE_DISTANCE,
            _padding: 0.0,
        }
    }

    /// Orbit the camera around the target.
    ///
    /// - `delta_azimuth`: horizontal rotation in radians (positive = rotate right)
    /// - `delta_elevation`: vertical rotation in radians (positive = rotate up)
    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth += delta_azimuth;
        // Wrap azimuth to [-PI, PI]
        while self.azimuth > PI {
            self.azimuth -= 2.0 * PI;
        }
        while self.azimuth < -PI {
            self.azimuth += 2.0 * PI;
        }

        self.elevation =
            (self.elevation + delta_elevation).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    /// Zoom the camera (change distance from target).
    ///
    /// Positive `delta` moves closer. The change is proportional to the
    /// current distance.
    pub fn zoom(&mut self, delta: f32) {
        let factor = 1.0 - delta * 0.1;
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Reset camera to default view
    pub fn reset(&mut self) {
        self.distance = DEFAULT_DISTANCE;
        self.azimuth = 0.0;
        self.elevation = 0.0;
        self.target = [0.0, 0.0, 0.0];
    }

    /// Set aspect ratio (call when window resizes)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

// =============================================================================
// Matrix Math Helpers
// =============================================================================

/// Compute a look-at view matrix
fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let f = normalize([target[0] - eye[0], target[1] - eye[1], target[2] - eye[2]]);
    let r = normalize(cross(f, up));
    let u = cross(r, f);

    // Right-handed, camera looks down -Z
    [
        [r[0], u[0], -f[0], 0.0],
        [r[1], u[1], -f[1], 0.0],
        [r[2], u[2], -f[2], 0.0],
        [-dot(r, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Compute a perspective projection matrix with wgpu's [0, 1] depth range
fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov / 2.0).tan();
    let nf = 1.0 / (near - far);

    // Column-major order for WGSL
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far * nf, -1.0],
        [0.0, 0.0, far * near * nf, 0.0],
    ]
}

/// Column-major 4x4 product `a * b`
fn mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (col, out_col) in out.iter_mut().enumerate() {
        for (row, cell) in out_col.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

/// Apply a column-major matrix to a point, returning homogeneous coordinates
pub fn transform_point(m: &[[f32; 4]; 4], p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, cell) in out.iter_mut().enumerate() {
        *cell = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
    }
    out
}

/// Normalize a 3D vector
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0] // Fallback for zero-length vectors
    }
}

/// Cross product of two 3D vectors
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Dot product of two 3D vectors
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
