//! nbody-galaxy - a disk galaxy of glowing particles orbiting a central attractor.
//!
//! The simulation runs on the CPU: [`galaxy`] generates the initial disk,
//! [`integrator`] advances it under softened central gravity and [`frame`]
//! drives one clamped timestep per frame. The [`gpu`] module mirrors the
//! particles into a vertex buffer and draws them as point sprites; [`app`]
//! wires everything to a window.

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod galaxy;
pub mod gpu;
pub mod headless;
pub mod integrator;
pub mod particle;
