//! Run configuration loaded from YAML
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard 3000-particle galaxy. Command-line flags are applied on top of
//! whatever the file provides.
//!
//! ```yaml
//! particles: 5000
//! seed: 42
//! disk:
//!   radius: 10.0
//!   thickness: 0.3
//! gravity:
//!   mu: 30.0
//! window:
//!   width: 1920
//!   height: 1080
//! ```

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::frame::DEFAULT_MAX_DT;
use crate::galaxy::{DEFAULT_PARTICLE_COUNT, DiskProfile, generate, generate_seeded};
use crate::gpu::RenderConfig;
use crate::integrator::CentralGravity;
use crate::particle::ParticleStore;

/// Everything needed to start a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of particles to generate
    pub particles: usize,
    /// RNG seed; a fresh OS seed is used when absent
    pub seed: Option<u64>,
    /// Initial disk distribution
    pub disk: DiskProfile,
    /// Central attractor
    pub gravity: CentralGravity,
    /// Upper bound on a single timestep, in seconds
    pub max_dt: f32,
    /// Window and sprite settings
    pub window: RenderConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particles: DEFAULT_PARTICLE_COUNT,
            seed: None,
            disk: DiskProfile::default(),
            gravity: CentralGravity::default(),
            max_dt: DEFAULT_MAX_DT,
            window: RenderConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path.display(), particles = config.particles, "loaded config");
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> SimResult<Self> {
        // An empty document deserializes as unit, not as an empty map
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate the initial particle store described by this config
    pub fn build_store(&self) -> ParticleStore {
        match self.seed {
            Some(seed) => generate_seeded(self.particles, &self.disk, seed),
            None => generate(self.particles, &self.disk, &mut StdRng::from_os_rng()),
        }
    }

    /// Reject values that would make the run produce non-finite state.
    pub fn validate(&self) -> SimResult<()> {
        self.disk.validate()?;

        let CentralGravity { mu, eps2, damping } = self.gravity;
        if !mu.is_finite() {
            return Err(SimError::Config(format!("gravity.mu must be finite, got {mu}")));
        }
        if !(eps2.is_finite() && eps2 > 0.0) {
            return Err(SimError::Config(format!(
                "gravity.eps2 must be positive, got {eps2}"
            )));
        }
        if !(damping.is_finite() && damping >= 0.0) {
            return Err(SimError::Config(format!(
                "gravity.damping must be non-negative, got {damping}"
            )));
        }
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            return Err(SimError::Config(format!(
                "max_dt must be positive, got {}",
                self.max_dt
            )));
        }
        if !(self.window.point_size.is_finite() && self.window.point_size > 0.0) {
            return Err(SimError::Config(format!(
                "window.point_size must be positive, got {}",
                self.window.point_size
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(SimError::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert_eq!(config.particles, 3000);
        assert_eq!(config.max_dt, 0.033);
        assert_eq!(config.gravity.mu, 25.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SimConfig::from_yaml(
            "particles: 500\nseed: 7\ndisk:\n  radius: 12.0\nwindow:\n  point_size: 4.0\n",
        )
        .unwrap();

        assert_eq!(config.particles, 500);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.disk.radius, 12.0);
        assert_eq!(config.disk.thickness, DiskProfile::default().thickness);
        assert_eq!(config.window.point_size, 4.0);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.gravity, CentralGravity::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(SimConfig::from_yaml("").unwrap(), SimConfig::default());
    }

    #[test]
    fn test_build_store_uses_seed() {
        let config = SimConfig {
            particles: 64,
            seed: Some(5),
            ..SimConfig::default()
        };
        let store = config.build_store();
        assert_eq!(store.len(), 64);
        assert_eq!(store, config.build_store());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "particles: 42\ngravity:\n  mu: 10.0").unwrap();

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.particles, 42);
        assert_eq!(config.gravity.mu, 10.0);
        assert_eq!(config.gravity.eps2, 0.04);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SimConfig::load(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(SimError::Io(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = SimConfig::from_yaml("particles: [1, 2");
        assert!(matches!(result, Err(SimError::Yaml(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            "gravity:\n  eps2: 0.0",
            "gravity:\n  mu: .nan",
            "gravity:\n  damping: -1.0",
            "max_dt: 0.0",
            "window:\n  point_size: 0.0",
            "window:\n  width: 0",
            "disk:\n  radius: -1.0",
            "disk:\n  thickness: -0.5",
        ];
        for yaml in cases {
            let result = SimConfig::from_yaml(yaml);
            assert!(
                matches!(result, Err(SimError::Config(_))),
                "expected config error for {yaml:?}"
            );
        }
    }
}
