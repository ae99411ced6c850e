//! Frame driver: timestep clamping and the per-frame update sequence
//!
//! A frame is `clock → integrate → sync`, in that order. The draw itself is
//! issued by the caller once `advance` has returned, so the GPU always sees
//! the state produced by this frame's step.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::error::{SimError, SimResult};
use crate::gpu::{GpuSync, VertexTarget};
use crate::integrator::CentralGravity;
use crate::particle::ParticleStore;

/// Default upper bound on a single timestep, in seconds (~30 Hz)
pub const DEFAULT_MAX_DT: f32 = 0.033;

/// Interval between FPS log lines
const FPS_INTERVAL: Duration = Duration::from_secs(1);

/// Clamp a raw elapsed time to `[0, cap]`. NaN and negative values map to 0.
pub fn clamp_dt(raw: f32, cap: f32) -> f32 {
    if raw.is_nan() || raw <= 0.0 {
        0.0
    } else {
        raw.min(cap)
    }
}

/// Measures wall-clock time between frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    max_dt: f32,
}

impl FrameClock {
    /// Start the clock at `start`; the first tick measures from here
    pub fn new(max_dt: f32, start: Instant) -> Self {
        Self {
            last: start,
            max_dt,
        }
    }

    /// Elapsed time since the previous tick, clamped to `[0, max_dt]`.
    ///
    /// An instant earlier than the previous one yields 0 and does not move
    /// the clock backwards.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.last).as_secs_f32();
        if now > self.last {
            self.last = now;
        }
        clamp_dt(raw, self.max_dt)
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }
}

/// What a single `advance` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frames completed so far, including this one
    pub frame: u64,
    /// Timestep applied this frame
    pub dt: f32,
    /// Total simulated time
    pub sim_time: f64,
}

#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    fn new(start: Instant) -> Self {
        Self {
            window_start: start,
            frames: 0,
        }
    }

    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= FPS_INTERVAL {
            let fps = self.frames as f64 / elapsed.as_secs_f64();
            debug!("{fps:.1} fps");
            self.window_start = now;
            self.frames = 0;
        }
    }
}

/// Owns the simulation state and drives it one frame at a time.
#[derive(Debug)]
pub struct FrameDriver {
    store: ParticleStore,
    gravity: CentralGravity,
    sync: GpuSync,
    clock: FrameClock,
    fps: FpsCounter,
    frame: u64,
    sim_time: f64,
    failure: Option<(usize, usize)>,
}

impl FrameDriver {
    pub fn new(
        store: ParticleStore,
        gravity: CentralGravity,
        max_dt: f32,
        start: Instant,
    ) -> Self {
        let sync = GpuSync::with_capacity(store.len());
        Self {
            store,
            gravity,
            sync,
            clock: FrameClock::new(max_dt, start),
            fps: FpsCounter::new(start),
            frame: 0,
            sim_time: 0.0,
            failure: None,
        }
    }

    /// Run one frame: measure and clamp dt, integrate, then sync into `target`.
    ///
    /// A sync failure is fatal. It is logged the first time it happens;
    /// every later call returns the same error without stepping the
    /// simulation again.
    pub fn advance<T: VertexTarget + ?Sized>(
        &mut self,
        now: Instant,
        target: &mut T,
    ) -> SimResult<FrameStats> {
        self.check_failed()?;
        let dt = self.clock.tick(now);
        let stats = self.run_frame(dt, target)?;
        self.fps.record(now);
        Ok(stats)
    }

    /// Like [`advance`](Self::advance) with a fixed `dt` instead of the
    /// wall clock. `dt` is still clamped to `[0, max_dt]`.
    pub fn advance_fixed<T: VertexTarget + ?Sized>(
        &mut self,
        dt: f32,
        target: &mut T,
    ) -> SimResult<FrameStats> {
        self.check_failed()?;
        let dt = clamp_dt(dt, self.clock.max_dt());
        self.run_frame(dt, target)
    }

    fn check_failed(&self) -> SimResult<()> {
        match self.failure {
            Some((capacity, store)) => Err(SimError::BufferMismatch { capacity, store }),
            None => Ok(()),
        }
    }

    fn run_frame<T: VertexTarget + ?Sized>(
        &mut self,
        dt: f32,
        target: &mut T,
    ) -> SimResult<FrameStats> {
        self.gravity.step(&mut self.store, dt);

        if let Err(e) = self.sync.sync(&self.store, target) {
            error!(error = %e, "GPU sync failed, stopping simulation");
            if let SimError::BufferMismatch { capacity, store } = e {
                self.failure = Some((capacity, store));
            }
            return Err(e);
        }

        self.frame += 1;
        self.sim_time += f64::from(dt);

        Ok(FrameStats {
            frame: self.frame,
            dt,
            sim_time: self.sim_time,
        })
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn gravity(&self) -> &CentralGravity {
        &self.gravity
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Whether a fatal sync error has stopped the driver
    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{DiskProfile, generate_seeded};
    use crate::gpu::VertexMirror;
    use crate::particle::Particle;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(0.01, DEFAULT_MAX_DT), 0.01);
        assert_eq!(clamp_dt(0.5, DEFAULT_MAX_DT), DEFAULT_MAX_DT);
        assert_eq!(clamp_dt(-0.2, DEFAULT_MAX_DT), 0.0);
        assert_eq!(clamp_dt(f32::NAN, DEFAULT_MAX_DT), 0.0);
        assert_eq!(clamp_dt(f32::INFINITY, DEFAULT_MAX_DT), DEFAULT_MAX_DT);
    }

    #[test]
    fn test_clock_measures_and_caps() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(DEFAULT_MAX_DT, t0);

        let dt = clock.tick(t0 + ms(16));
        assert!((dt - 0.016).abs() < 1e-4);

        // A two-second stall is capped
        let dt = clock.tick(t0 + ms(2016));
        assert_eq!(dt, DEFAULT_MAX_DT);
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(DEFAULT_MAX_DT, t0 + ms(100));

        assert_eq!(clock.tick(t0), 0.0);
        let dt = clock.tick(t0 + ms(110));
        assert!((dt - 0.010).abs() < 1e-4);
    }

    #[test]
    fn test_advance_steps_then_syncs() {
        let t0 = Instant::now();
        let store = generate_seeded(200, &DiskProfile::default(), 11);
        let mut expected = store.clone();
        let mut driver = FrameDriver::new(store, CentralGravity::default(), DEFAULT_MAX_DT, t0);
        let mut mirror = VertexMirror::new(200);

        let stats = driver.advance(t0 + ms(20), &mut mirror).unwrap();
        CentralGravity::default().step(&mut expected, stats.dt);

        assert_eq!(stats.frame, 1);
        assert_eq!(driver.store(), &expected);
        assert_eq!(mirror.vertices(), expected.vertices().as_slice());
    }

    #[test]
    fn test_sim_time_accumulates_clamped_dt() {
        let t0 = Instant::now();
        let store = generate_seeded(10, &DiskProfile::default(), 1);
        let mut driver = FrameDriver::new(store, CentralGravity::default(), DEFAULT_MAX_DT, t0);
        let mut mirror = VertexMirror::new(10);

        driver.advance(t0 + ms(10), &mut mirror).unwrap();
        let stats = driver.advance(t0 + ms(1010), &mut mirror).unwrap();

        assert_eq!(stats.frame, 2);
        assert_eq!(stats.dt, DEFAULT_MAX_DT);
        assert!((stats.sim_time - (0.010 + f64::from(DEFAULT_MAX_DT))).abs() < 1e-4);
    }

    #[test]
    fn test_zero_elapsed_leaves_state_unchanged() {
        let t0 = Instant::now();
        let store = generate_seeded(50, &DiskProfile::default(), 2);
        let original = store.clone();
        let mut driver = FrameDriver::new(store, CentralGravity::default(), DEFAULT_MAX_DT, t0);
        let mut mirror = VertexMirror::new(50);

        let stats = driver.advance(t0, &mut mirror).unwrap();

        assert_eq!(stats.dt, 0.0);
        assert_eq!(driver.store(), &original);
    }

    #[test]
    fn test_mismatch_stops_driver() {
        let t0 = Instant::now();
        let store = ParticleStore::from_particles(vec![
            Particle::new([1.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            Particle::new([0.0, 2.0, 0.0], [1.0, 1.0, 1.0]),
        ]);
        let mut driver = FrameDriver::new(store, CentralGravity::default(), DEFAULT_MAX_DT, t0);
        let mut mirror = VertexMirror::new(3);

        let first = driver.advance(t0 + ms(10), &mut mirror);
        assert!(matches!(
            first,
            Err(SimError::BufferMismatch {
                capacity: 3,
                store: 2
            })
        ));
        assert!(driver.has_failed());

        let stepped = driver.store().clone();
        let second = driver.advance(t0 + ms(20), &mut mirror);
        assert!(matches!(second, Err(SimError::BufferMismatch { .. })));
        assert_eq!(driver.store(), &stepped);
        assert_eq!(driver.frame(), 0);
    }

    #[test]
    fn test_advance_fixed_clamps() {
        let store = generate_seeded(10, &DiskProfile::default(), 3);
        let mut driver =
            FrameDriver::new(store, CentralGravity::default(), DEFAULT_MAX_DT, Instant::now());
        let mut mirror = VertexMirror::new(10);

        assert_eq!(driver.advance_fixed(0.016, &mut mirror).unwrap().dt, 0.016);
        assert_eq!(driver.advance_fixed(1.0, &mut mirror).unwrap().dt, DEFAULT_MAX_DT);
        assert_eq!(driver.advance_fixed(-1.0, &mut mirror).unwrap().dt, 0.0);
        assert_eq!(driver.frame(), 3);
        assert_eq!(mirror.vertices(), driver.store().vertices().as_slice());
    }
}
