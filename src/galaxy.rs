//! Disk galaxy distribution generator
//!
//! Builds the initial [`ParticleStore`] as a thin rotating disk:
//!
//! - **Radius**: inverted exponential profile, so particles crowd the center
//! - **Height**: normally distributed around the disk plane
//! - **Velocity**: tangential, with a softened Keplerian-like falloff
//! - **Color**: blended from an inner to an outer color by radius
//!
//! The orbital speed is an empirical curve and is not derived from the
//! integrator's gravitational parameter, so generated orbits are not exactly
//! circular under [`crate::integrator::CentralGravity`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::particle::{Particle, ParticleStore};

/// Default number of particles
pub const DEFAULT_PARTICLE_COUNT: usize = 3000;

/// Default disk radius (world units)
pub const DEFAULT_DISK_RADIUS: f32 = 8.0;

/// Default standard deviation of the out-of-plane coordinate
pub const DEFAULT_DISK_THICKNESS: f32 = 0.2;

/// Default orbital velocity scale
pub const DEFAULT_VELOCITY_SCALE: f32 = 2.0;

/// Default softening added to the radius in the orbital speed curve
pub const DEFAULT_VELOCITY_SOFTENING: f32 = 0.2;

/// Floor on the uniform draw, keeps `ln(1 - u)` away from the singularity
pub const DEFAULT_RADIUS_FLOOR: f32 = 1e-4;

/// Warm magenta used at the disk center
pub const DEFAULT_INNER_COLOR: [f32; 3] = [0.8, 0.6, 1.0];

/// Golden color used at the disk edge
pub const DEFAULT_OUTER_COLOR: [f32; 3] = [1.0, 0.8, 0.2];

/// Radii below this are treated as lying on the axis
const DEGENERATE_RADIUS: f32 = 1e-6;

/// Shape, kinematics and coloring of the generated disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskProfile {
    /// Maximum in-plane radius (`Rmax`)
    pub radius: f32,
    /// Standard deviation of z
    pub thickness: f32,
    /// Orbital speed scale (`vScale`)
    pub velocity_scale: f32,
    /// Softening in `vScale / sqrt(r + soften)`
    pub softening: f32,
    /// Floor on the uniform radial draw
    pub radius_floor: f32,
    /// Color at r = 0
    pub inner_color: [f32; 3],
    /// Color at r = Rmax
    pub outer_color: [f32; 3],
}

impl Default for DiskProfile {
    fn default() -> Self {
        Self {
            radius: DEFAULT_DISK_RADIUS,
            thickness: DEFAULT_DISK_THICKNESS,
            velocity_scale: DEFAULT_VELOCITY_SCALE,
            softening: DEFAULT_VELOCITY_SOFTENING,
            radius_floor: DEFAULT_RADIUS_FLOOR,
            inner_color: DEFAULT_INNER_COLOR,
            outer_color: DEFAULT_OUTER_COLOR,
        }
    }
}

impl DiskProfile {
    /// Check that the profile can produce finite particles
    pub fn validate(&self) -> SimResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimError::Config(format!(
                "disk radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.thickness.is_finite() && self.thickness >= 0.0) {
            return Err(SimError::Config(format!(
                "disk thickness must be non-negative, got {}",
                self.thickness
            )));
        }
        if !self.velocity_scale.is_finite() {
            return Err(SimError::Config("velocity scale must be finite".into()));
        }
        if !(self.softening.is_finite() && self.softening > 0.0) {
            return Err(SimError::Config(format!(
                "velocity softening must be positive, got {}",
                self.softening
            )));
        }
        if !(self.radius_floor > 0.0 && self.radius_floor < 1.0) {
            return Err(SimError::Config(format!(
                "radius floor must lie in (0, 1), got {}",
                self.radius_floor
            )));
        }
        for (name, color) in [("inner", self.inner_color), ("outer", self.outer_color)] {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(SimError::Config(format!(
                    "{name} color channels must lie in [0, 1], got {color:?}"
                )));
            }
        }
        Ok(())
    }

    /// Radius for a uniform draw `u` in [0, 1), clamped to the disk edge
    pub fn radius_for(&self, u: f32) -> f32 {
        let r = -self.radius * (1.0 - u.max(self.radius_floor)).ln();
        r.min(self.radius)
    }

    /// Orbital speed at radius `r`
    pub fn orbital_speed(&self, r: f32) -> f32 {
        self.velocity_scale / (r + self.softening).sqrt()
    }

    /// Color for a particle at radius `r`
    pub fn color_for(&self, r: f32) -> [f32; 3] {
        let t = (r / self.radius).clamp(0.0, 1.0);
        lerp_color(self.inner_color, self.outer_color, t)
    }
}

/// Linear blend of two colors. Exact at `t = 0` and `t = 1`.
pub fn lerp_color(inner: [f32; 3], outer: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: f32, b: f32| (a * (1.0 - t) + b * t).clamp(0.0, 1.0);
    [
        mix(inner[0], outer[0]),
        mix(inner[1], outer[1]),
        mix(inner[2], outer[2]),
    ]
}

/// Counter-clockwise unit tangent for a point in the disk plane.
///
/// On the axis the radial direction is undefined; +x is used so the result
/// is always a unit vector.
pub fn tangent_at(x: f32, y: f32) -> [f32; 3] {
    let len = (x * x + y * y).sqrt();
    let (rx, ry) = if len > DEGENERATE_RADIUS {
        (x / len, y / len)
    } else {
        (1.0, 0.0)
    };
    [-ry, rx, 0.0]
}

/// Generate exactly `n` particles forming a disk galaxy.
pub fn generate<R: Rng>(n: usize, profile: &DiskProfile, rng: &mut R) -> ParticleStore {
    let mut particles = Vec::with_capacity(n);
    for _ in 0..n {
        let u: f32 = rng.random();
        let r = profile.radius_for(u);

        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        let x = r * theta.cos();
        let y = r * theta.sin();
        let z = rng.sample::<f32, _>(StandardNormal) * profile.thickness;

        let tangent = tangent_at(x, y);
        let speed = profile.orbital_speed(r);
        let velocity = [tangent[0] * speed, tangent[1] * speed, 0.0];

        particles.push(Particle::new([x, y, z], profile.color_for(r)).with_velocity(velocity));
    }

    debug!(count = n, radius = profile.radius, "generated disk galaxy");
    ParticleStore::from_particles(particles)
}

/// Generate with a reproducible seed
pub fn generate_seeded(n: usize, profile: &DiskProfile, seed: u64) -> ParticleStore {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(n, profile, &mut rng)
}

/// Generate with the default profile, seeded from the OS
pub fn generate_default(n: usize) -> ParticleStore {
    let mut rng = StdRng::from_os_rng();
    generate(n, &DiskProfile::default(), &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn test_generates_exact_count() {
        let profile = DiskProfile::default();
        for n in [0, 1, 2, 17, 3000] {
            let store = generate_seeded(n, &profile, 7);
            assert_eq!(store.len(), n);
        }
    }

    #[test]
    fn test_radius_within_disk() {
        let profile = DiskProfile::default();
        let store = generate_seeded(5000, &profile, 42);

        for p in &store {
            let r = p.planar_radius();
            assert!(r >= 0.0);
            // Rounding in r*cos / r*sin may nudge the recomputed radius by an ulp
            assert!(r <= profile.radius * (1.0 + 1e-5), "radius {r} outside disk");
        }
    }

    #[test]
    fn test_denser_near_center() {
        let profile = DiskProfile::default();
        let store = generate_seeded(5000, &profile, 1);

        // Particles per unit area in a central disk versus an outer annulus
        let area = |r0: f32, r1: f32| std::f32::consts::PI * (r1 * r1 - r0 * r0);
        let count = |r0: f32, r1: f32| {
            store
                .iter()
                .filter(|p| (r0..r1).contains(&p.planar_radius()))
                .count() as f32
        };
        let center = count(0.0, 2.0) / area(0.0, 2.0);
        let rim = count(6.0, 7.9) / area(6.0, 7.9);
        assert!(center > 4.0 * rim, "center {center} vs rim {rim}");
    }

    #[test]
    fn test_disk_is_thin() {
        let profile = DiskProfile::default();
        let store = generate_seeded(5000, &profile, 3);

        let mean_abs_z: f32 =
            store.iter().map(|p| p.position[2].abs()).sum::<f32>() / store.len() as f32;
        let mean_r: f32 = store.iter().map(Particle::planar_radius).sum::<f32>() / store.len() as f32;

        assert!(mean_abs_z > 0.0, "disk should not be degenerate in z");
        assert!(mean_abs_z < mean_r / 5.0);
    }

    #[test]
    fn test_colors_within_unit_range() {
        let store = generate_seeded(2000, &DiskProfile::default(), 11);
        for p in &store {
            assert!(p.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_color_extremes_match_exactly() {
        let profile = DiskProfile::default();
        assert_eq!(lerp_color(profile.inner_color, profile.outer_color, 0.0), DEFAULT_INNER_COLOR);
        assert_eq!(lerp_color(profile.inner_color, profile.outer_color, 1.0), DEFAULT_OUTER_COLOR);
        assert_eq!(profile.color_for(0.0), DEFAULT_INNER_COLOR);
        assert_eq!(profile.color_for(profile.radius), DEFAULT_OUTER_COLOR);
        assert_eq!(profile.color_for(profile.radius * 3.0), DEFAULT_OUTER_COLOR);
    }

    #[test]
    fn test_velocity_is_tangential_and_consistent() {
        let store = generate_seeded(1000, &DiskProfile::default(), 5);

        for p in &store {
            let radial = [p.position[0], p.position[1], 0.0];
            let v = p.velocity;
            assert_eq!(v[2], 0.0);
            // Perpendicular to the radial direction
            assert!(dot(radial, v).abs() < 1e-3 * (1.0 + p.planar_radius()));
            // Same circulation sense everywhere: z of (r x v) is positive
            let lz = radial[0] * v[1] - radial[1] * v[0];
            assert!(lz >= 0.0);
        }
    }

    #[test]
    fn test_orbital_speed_falls_off() {
        let profile = DiskProfile::default();
        assert!(profile.orbital_speed(0.5) > profile.orbital_speed(4.0));
        assert!((profile.orbital_speed(0.0) - 2.0 / 0.2_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_tangent_at_origin_is_finite() {
        let t = tangent_at(0.0, 0.0);
        assert_eq!(t, [0.0, 1.0, 0.0]);

        let t = tangent_at(1e-9, -1e-9);
        assert!(t.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_radius_for_clamps_and_floors() {
        let profile = DiskProfile::default();
        // u = 0 is floored rather than producing r = 0
        assert!(profile.radius_for(0.0) > 0.0);
        // u close to 1 would diverge without the clamp
        assert_eq!(profile.radius_for(0.999_999), profile.radius);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let profile = DiskProfile::default();
        let a = generate_seeded(100, &profile, 99);
        let b = generate_seeded(100, &profile, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_thickness_is_rejected() {
        let profile = DiskProfile {
            thickness: -1.0,
            ..DiskProfile::default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_zero_thickness_gives_flat_disk() {
        let profile = DiskProfile {
            thickness: 0.0,
            ..DiskProfile::default()
        };
        let store = generate_seeded(100, &profile, 0);
        assert!(store.iter().all(|p| p.position[2] == 0.0));
    }

    #[test]
    fn test_default_generation() {
        let store = generate_default(64);
        assert_eq!(store.len(), 64);
        assert!(store.all_finite());
    }
}
