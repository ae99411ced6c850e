//! Windowless runs for scripting and CI
//!
//! Drives the same frame sequence as the windowed app with a fixed timestep,
//! syncing into a [`VertexMirror`] instead of a GPU buffer, and reports a
//! JSON-serializable summary of the final state.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::frame::{FrameDriver, clamp_dt};
use crate::gpu::VertexMirror;
use crate::particle::ParticleStore;

/// Final state of a headless run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub particles: usize,
    pub steps: u64,
    /// Timestep applied on every step, after clamping
    pub dt: f32,
    pub sim_time: f64,
    pub max_radius: f32,
    pub max_speed: f32,
    pub kinetic_energy: f64,
    pub all_finite: bool,
}

impl RunSummary {
    fn new(store: &ParticleStore, steps: u64, dt: f32, sim_time: f64) -> Self {
        Self {
            particles: store.len(),
            steps,
            dt,
            sim_time,
            max_radius: store.max_radius(),
            max_speed: store.max_speed(),
            kinetic_energy: store.kinetic_energy(),
            all_finite: store.all_finite(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Generate the configured galaxy and advance it `steps` times by `dt`.
pub fn simulate(config: &SimConfig, steps: u64, dt: f32) -> SimResult<RunSummary> {
    config.validate()?;

    let store = config.build_store();
    let mut mirror = VertexMirror::new(store.len());
    let mut driver = FrameDriver::new(store, config.gravity, config.max_dt, Instant::now());

    for _ in 0..steps {
        driver.advance_fixed(dt, &mut mirror)?;
    }

    let summary = RunSummary::new(
        driver.store(),
        steps,
        clamp_dt(dt, config.max_dt),
        driver.sim_time(),
    );
    info!(
        particles = summary.particles,
        steps,
        sim_time = summary.sim_time,
        "headless run finished"
    );
    Ok(summary)
}
