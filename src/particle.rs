//! The particle store: sole owner of simulation state
//!
//! A [`ParticleStore`] is built once by the distribution generator and then
//! mutated in place by the integrator every frame. Its length never changes
//! after construction.

use crate::gpu::ParticleVertex;

/// A single simulated point.
///
/// `color` is display-only and fixed at creation. `position` and `velocity`
/// fully determine the particle's future under the central force law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World-space position
    pub position: [f32; 3],
    /// RGB color, each channel in [0, 1]
    pub color: [f32; 3],
    /// World-space velocity
    pub velocity: [f32; 3],
    /// Mass (uniform 1.0 today; the force law is mass-independent)
    pub mass: f32,
}

impl Particle {
    /// Create a particle at rest with unit mass
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            color,
            velocity: [0.0, 0.0, 0.0],
            mass: 1.0,
        }
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: [f32; 3]) -> Self {
        self.velocity = velocity;
        self
    }

    /// Distance from the z axis
    pub fn planar_radius(&self) -> f32 {
        (self.position[0] * self.position[0] + self.position[1] * self.position[1]).sqrt()
    }

    /// Magnitude of the velocity
    pub fn speed(&self) -> f32 {
        let [vx, vy, vz] = self.velocity;
        (vx * vx + vy * vy + vz * vz).sqrt()
    }

    /// The GPU-facing subset of this particle
    pub fn vertex(&self) -> ParticleVertex {
        ParticleVertex::new(self.position, self.color)
    }
}

/// Fixed-length, ordered collection of particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    /// Take ownership of a batch of particles. The length is fixed from here on.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Mutable access to each particle. Cannot add or remove entries.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    /// Packed (position, color) records in store order
    pub fn vertices(&self) -> Vec<ParticleVertex> {
        let mut out = Vec::with_capacity(self.len());
        self.write_vertices(&mut out);
        out
    }

    /// Refill `out` with the packed mirror, reusing its allocation
    pub fn write_vertices(&self, out: &mut Vec<ParticleVertex>) {
        out.clear();
        out.extend(self.particles.iter().map(Particle::vertex));
    }

    /// Total kinetic energy, `sum(m * |v|^2 / 2)`
    pub fn kinetic_energy(&self) -> f64 {
        self.particles
            .iter()
            .map(|p| {
                let s = p.speed() as f64;
                0.5 * p.mass as f64 * s * s
            })
            .fold(0.0, |total, e| total + e)
    }

    /// Largest in-plane distance from the origin
    pub fn max_radius(&self) -> f32 {
        self.particles
            .iter()
            .map(Particle::planar_radius)
            .fold(0.0, f32::max)
    }

    pub fn max_speed(&self) -> f32 {
        self.particles.iter().map(Particle::speed).fold(0.0, f32::max)
    }

    /// True when no position or velocity component is NaN or infinite
    pub fn all_finite(&self) -> bool {
        self.particles.iter().all(|p| {
            p.position.iter().all(|c| c.is_finite()) && p.velocity.iter().all(|c| c.is_finite())
        })
    }
}

impl<'a> IntoIterator for &'a ParticleStore {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ParticleStore {
        ParticleStore::from_particles(vec![
            Particle::new([3.0, 4.0, 0.5], [1.0, 0.0, 0.0]).with_velocity([0.0, 2.0, 0.0]),
            Particle::new([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).with_velocity([1.0, 0.0, 0.0]),
        ])
    }

    #[test]
    fn test_particle_defaults() {
        let p = Particle::new([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]);
        assert_eq!(p.velocity, [0.0, 0.0, 0.0]);
        assert_eq!(p.mass, 1.0);
    }

    #[test]
    fn test_planar_radius_ignores_z() {
        let p = Particle::new([3.0, 4.0, 100.0], [0.0; 3]);
        assert!((p.planar_radius() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_vertices_follow_store_order() {
        let store = sample_store();
        let vertices = store.vertices();

        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].position, [3.0, 4.0, 0.5]);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].position, [-1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].color, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_write_vertices_replaces_previous_contents() {
        let store = sample_store();
        let mut scratch = vec![ParticleVertex::default(); 7];

        store.write_vertices(&mut scratch);

        assert_eq!(scratch.len(), store.len());
    }

    #[test]
    fn test_diagnostics() {
        let store = sample_store();

        // 0.5 * 1 * 4 + 0.5 * 1 * 1
        assert!((store.kinetic_energy() - 2.5).abs() < 1e-9);
        assert!((store.max_radius() - 5.0).abs() < 1e-6);
        assert!((store.max_speed() - 2.0).abs() < 1e-6);
        assert!(store.all_finite());
    }

    #[test]
    fn test_all_finite_detects_nan() {
        let store = ParticleStore::from_particles(vec![
            Particle::new([0.0, 0.0, 0.0], [0.0; 3]).with_velocity([f32::NAN, 0.0, 0.0]),
        ]);
        assert!(!store.all_finite());
    }

    #[test]
    fn test_empty_store() {
        let store = ParticleStore::default();
        assert!(store.is_empty());
        assert_eq!(store.max_radius(), 0.0);
        assert_eq!(store.kinetic_energy(), 0.0);
        assert!(store.vertices().is_empty());
    }
}
