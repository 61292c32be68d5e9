//! Fixed timestep accumulator for logic updates
//!
//! Frame time is added to an accumulator and drained in whole logic steps,
//! so logic runs at a constant rate independent of the render rate.

use tracing::warn;

/// Logic step length used when none is configured, in seconds
pub const DEFAULT_TIMESTEP: f32 = 0.001;

/// Accumulator turning variable frame times into fixed logic steps
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Time not yet consumed by a logic step
    accumulator: f32,
    /// Length of one logic step in seconds
    pub timestep: f32,
    /// Upper bound on steps per frame; `None` catches up fully
    pub max_steps_per_frame: Option<u32>,
}

impl FixedTimestep {
    pub fn new(timestep: f32) -> Self {
        Self {
            accumulator: 0.0,
            timestep,
            max_steps_per_frame: None,
        }
    }

    /// Limits the steps of a single frame; leftover time is dropped
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps_per_frame = Some(max_steps);
        self
    }

    /// Adds frame time and returns the number of logic steps to run
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        if self.timestep <= 0.0 {
            return 0;
        }
        self.accumulator += delta_time.max(0.0);

        let mut steps = (self.accumulator / self.timestep) as u32;
        self.accumulator -= steps as f32 * self.timestep;

        if let Some(max_steps) = self.max_steps_per_frame {
            if steps > max_steps {
                warn!(
                    steps,
                    max_steps, "Logic fell behind, dropping the remaining catch-up steps"
                );
                steps = max_steps;
                self.accumulator = 0.0;
            }
        }

        // Float drift can leave a value just under zero
        self.accumulator = self.accumulator.max(0.0);
        steps
    }

    /// How far between two logic steps the current frame is, in [0, 1)
    pub fn interpolation_alpha(&self) -> f32 {
        if self.timestep <= 0.0 {
            return 0.0;
        }
        self.accumulator / self.timestep
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn accumulated_time(&self) -> f32 {
        self.accumulator
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTEP)
    }
}
