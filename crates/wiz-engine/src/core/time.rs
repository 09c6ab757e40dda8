/// Fixed timestep accumulator.
/// Turns variable host frame times into a whole number of simulation ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Seconds per tick.
    dt: f32,
    /// Leftover seconds not yet consumed by a tick.
    accumulator: f32,
    /// Ticks allowed per host frame before time is dropped.
    max_steps: u32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: 10,
        }
    }

    /// Timestep for a target tick rate.
    pub fn from_fps(fps: f32) -> Self {
        Self::new(1.0 / fps)
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    ///
    /// A long stall (tab in the background, debugger pause) is capped at
    /// `max_steps` ticks; the rest of the stall is dropped.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// How far the host frame sits between the last tick and the next (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_per_frame_at_target_rate() {
        let mut ts = FixedTimestep::from_fps(60.0);
        assert_eq!(ts.accumulate(1.0 / 60.0), 1);
    }

    #[test]
    fn partial_frames_carry_over() {
        let mut ts = FixedTimestep::from_fps(60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut ts = FixedTimestep::from_fps(60.0).with_max_steps(4);
        assert_eq!(ts.accumulate(1.0), 4);
        assert_eq!(ts.alpha(), 0.0);
    }

    #[test]
    fn negative_frame_time_is_ignored() {
        let mut ts = FixedTimestep::from_fps(60.0);
        ts.accumulate(0.008);
        assert_eq!(ts.accumulate(-5.0), 0);
        let a = ts.alpha();
        assert!(a > 0.0 && a < 1.0, "alpha was {a}");
        ts.reset();
        assert_eq!(ts.alpha(), 0.0);
    }
}
