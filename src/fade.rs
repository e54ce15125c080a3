//! Linear volume ramps.
//!
//! A ramp moves from one volume to another in [`FADE_STEPS`] equal steps,
//! one step per `duration / FADE_STEPS` milliseconds. Intermediate levels are
//! rounded; the final step always lands exactly on the target.
//!
//! The ramp itself is pure state. Timing is owned by whoever drives it (the
//! session schedules one step at a time on its [`crate::scheduler::Scheduler`]).

/// Number of discrete steps in every ramp.
pub const FADE_STEPS: u32 = 20;

/// Fade-out length when switching moods.
pub const MOOD_FADE_MS: u64 = 1000;

/// Fade length (both directions) for a manual track skip.
pub const SKIP_FADE_MS: u64 = 800;

/// Delay between a new source becoming audible and the fade-in starting.
pub const FADE_IN_DELAY_MS: u64 = 100;

/// Result of advancing a ramp by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampTick {
    /// Intermediate level, more steps follow.
    Level(u8),
    /// Final level, the ramp is finished.
    Done(u8),
}

impl RampTick {
    #[must_use]
    pub const fn volume(self) -> u8 {
        match self {
            RampTick::Level(v) | RampTick::Done(v) => v,
        }
    }
}

/// An in-progress linear ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRamp {
    from: u8,
    to: u8,
    step: u32,
    level: f64,
    step_ms: u64,
}

impl VolumeRamp {
    #[must_use]
    pub fn new(from: u8, to: u8, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            step: 0,
            level: f64::from(from),
            step_ms: duration_ms / u64::from(FADE_STEPS),
        }
    }

    /// Interval between two steps.
    #[must_use]
    pub const fn step_ms(&self) -> u64 {
        self.step_ms
    }

    #[must_use]
    pub const fn target(&self) -> u8 {
        self.to
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.step >= FADE_STEPS
    }

    /// Advances one step. Calling again after `Done` keeps returning `Done(to)`.
    pub fn advance(&mut self) -> RampTick {
        if self.is_finished() {
            return RampTick::Done(self.to);
        }
        self.step += 1;
        let delta = (f64::from(self.to) - f64::from(self.from)) / f64::from(FADE_STEPS);
        self.level += delta;

        if self.is_finished() {
            self.level = f64::from(self.to);
            RampTick::Done(self.to)
        } else {
            RampTick::Level(round_volume(self.level))
        }
    }
}

fn round_volume(level: f64) -> u8 {
    // clamp guards against accumulated float error just outside 0..=100
    level.round().clamp(0.0, 100.0) as u8
}

/// Every level a ramp from `from` to `to` passes through, final level included.
#[must_use]
pub fn ramp_levels(from: u8, to: u8) -> Vec<u8> {
    let mut ramp = VolumeRamp::new(from, to, 0);
    let mut levels = Vec::with_capacity(FADE_STEPS as usize);
    loop {
        match ramp.advance() {
            RampTick::Level(v) => levels.push(v),
            RampTick::Done(v) => {
                levels.push(v);
                return levels;
            }
        }
    }
}
