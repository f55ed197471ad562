// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-step driver turning frame time into runner ticks.

use ordoplay_ability_runtime::Runner;

/// Accumulates frame time and releases it in fixed steps
#[derive(Debug, Clone)]
pub struct FixedStepDriver {
    /// Simulation step in seconds
    fixed_timestep: f64,
    /// Step limit per frame
    max_steps_per_frame: u32,
    /// Accumulated delta time not yet consumed
    accumulated_time: f64,
    /// Total steps released
    step_count: u64,
    /// Frames that hit the step limit and dropped their backlog
    dropped_frames: u64,
}

impl FixedStepDriver {
    /// Create a driver; a non-positive step falls back to 60 Hz
    pub fn new(fixed_timestep: f64, max_steps_per_frame: u32) -> Self {
        let fixed_timestep = if fixed_timestep.is_finite() && fixed_timestep > 0.0 {
            fixed_timestep
        } else {
            tracing::warn!("Invalid fixed timestep {fixed_timestep}, using 1/60");
            1.0 / 60.0
        };
        Self {
            fixed_timestep,
            max_steps_per_frame: max_steps_per_frame.max(1),
            accumulated_time: 0.0,
            step_count: 0,
            dropped_frames: 0,
        }
    }

    /// Feed one frame of wall-clock time
    /// Returns the number of fixed timesteps to run
    pub fn update(&mut self, delta_time: f64) -> u32 {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return 0;
        }
        self.accumulated_time += delta_time;

        let mut steps = 0;
        while self.accumulated_time >= self.fixed_timestep {
            self.accumulated_time -= self.fixed_timestep;
            steps += 1;

            // Limit max steps per frame to prevent spiral of death
            if steps >= self.max_steps_per_frame {
                if self.accumulated_time >= self.fixed_timestep {
                    self.dropped_frames += 1;
                    tracing::debug!(
                        "Dropping {:.4}s of backlog after {steps} steps",
                        self.accumulated_time
                    );
                }
                self.accumulated_time = 0.0;
                break;
            }
        }

        self.step_count += u64::from(steps);
        steps
    }

    /// Feed one frame and tick the runner once per released step
    pub fn drive(&mut self, runner: &mut Runner, delta_time: f64) -> u32 {
        let steps = self.update(delta_time);
        for _ in 0..steps {
            runner.tick(self.fixed_timestep as f32);
        }
        steps
    }

    /// Simulation step in seconds
    pub fn fixed_timestep(&self) -> f64 {
        self.fixed_timestep
    }

    /// Time waiting for the next step
    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    /// Total steps released so far
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Frames whose backlog was dropped
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}
