//! Explicit Euler integration under a fixed central attractor
//!
//! Every particle evolves independently in a shared force field, so one step
//! is O(n). There is no particle-particle interaction: the attractor is a
//! single point mass pinned at the origin.
//!
//! Forward Euler drifts in energy for large `dt`. Callers bound `dt` (see
//! [`crate::frame::clamp_dt`]) and the force law is softened near the origin.

use serde::{Deserialize, Serialize};

use crate::particle::ParticleStore;

/// Default gravitational parameter `G * M_central`
pub const DEFAULT_MU: f32 = 25.0;

/// Default squared softening length
pub const DEFAULT_EPS2: f32 = 0.04;

/// Default uniform velocity damping rate (disabled)
pub const DEFAULT_DAMPING: f32 = 0.0;

/// A source of acceleration as a function of position.
///
/// Implementations add no state to particles; mass is not consulted.
pub trait ForceField {
    /// Acceleration felt by a particle at `position`
    fn acceleration(&self, position: [f32; 3]) -> [f32; 3];
}

/// Softened point-mass attractor at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralGravity {
    /// Gravitational parameter `G * M`
    pub mu: f32,
    /// Softening added to `|r|^2`
    pub eps2: f32,
    /// Velocity damping per second (0 = none)
    pub damping: f32,
}

impl Default for CentralGravity {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            eps2: DEFAULT_EPS2,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl ForceField for CentralGravity {
    fn acceleration(&self, position: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = position;
        let r2 = x * x + y * y + z * z + self.eps2;
        let r3 = r2.powf(1.5);
        let k = -self.mu / r3;
        [k * x, k * y, k * z]
    }
}

impl CentralGravity {
    /// Advance every particle by `dt` seconds
    pub fn step(&self, store: &mut ParticleStore, dt: f32) {
        euler_step(store, self, self.damping, dt);
    }
}

/// One forward Euler step in `field`, with optional uniform damping.
///
/// Velocity is updated first and the new velocity moves the position.
/// `dt` must be non-negative; `dt = 0` leaves the store unchanged.
pub fn euler_step<F: ForceField + ?Sized>(
    store: &mut ParticleStore,
    field: &F,
    damping: f32,
    dt: f32,
) {
    let keep = 1.0 - damping * dt;
    for p in store.iter_mut() {
        let a = field.acceleration(p.position);
        for i in 0..3 {
            p.velocity[i] = (p.velocity[i] + a[i] * dt) * keep;
            p.position[i] += p.velocity[i] * dt;
        }
    }
}

/// Step with the default central attractor
pub fn integrate(store: &mut ParticleStore, dt: f32) {
    CentralGravity::default().step(store, dt);
}
