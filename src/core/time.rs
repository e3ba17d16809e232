//! Simulation timing utilities

/// Upper bound on fixed steps run for a single frame.
///
/// A long hitch would otherwise queue an unbounded number of physics steps.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 8;

/// Tracks simulation time and splits variable frames into fixed physics steps.
///
/// Time only advances when the host calls [`SimClock::advance`] or
/// [`SimClock::tick_frame`]; nothing here reads the wall clock.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulation time in seconds
    time: f32,
    /// Fixed physics step in seconds
    fixed_dt: f32,
    /// Unconsumed frame time waiting for the next fixed step
    accumulator: f32,
    /// Maximum fixed steps per frame
    max_substeps: u32,
    frame_count: u64,
    physics_steps: u64,
    /// Frame time dropped because the substep cap was hit
    dropped_time: f32,
}

impl SimClock {
    /// Create a clock with the given fixed physics step
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            time: 0.0,
            fixed_dt,
            accumulator: 0.0,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            frame_count: 0,
            physics_steps: 0,
            dropped_time: 0.0,
        }
    }

    /// Set the substep cap
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps.max(1);
        self
    }

    /// Record a frame of `dt` seconds and return how many fixed steps are due.
    ///
    /// Time beyond the substep cap is discarded rather than carried over.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.tick_frame(dt);
        self.accumulator += dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_substeps {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if steps == self.max_substeps && self.accumulator >= self.fixed_dt {
            self.dropped_time += self.accumulator;
            log::debug!(
                "Substep cap hit, dropping {:.4}s of simulation time",
                self.accumulator
            );
            self.accumulator = 0.0;
        }

        steps
    }

    /// Advance simulation time by a frame without touching the accumulator
    pub fn tick_frame(&mut self, dt: f32) {
        self.time += dt.max(0.0);
        self.frame_count += 1;
    }

    /// Count one executed physics step
    pub fn record_physics_step(&mut self) {
        self.physics_steps += 1;
    }

    /// Current simulation time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Fixed physics step in seconds
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Number of frames seen so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of physics steps executed so far
    pub fn physics_steps(&self) -> u64 {
        self.physics_steps
    }

    /// Total simulation time discarded by the substep cap
    pub fn dropped_time(&self) -> f32 {
        self.dropped_time
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(1.0 / 50.0)
    }
}
