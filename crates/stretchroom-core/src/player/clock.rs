//! One-second countdown clock.
//!
//! Like the playback engine, the clock has no thread of its own: the host
//! calls [`CountdownClock::tick`] once per elapsed second. A cleared clock
//! ignores ticks, so there is never a stale countdown firing into a new
//! session.

/// Result of a single [`CountdownClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// No countdown is armed.
    Idle,
    /// Decremented; this many seconds remain.
    Counting(u32),
    /// Reached zero. Emitted once per `start`, after which the clock is idle.
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct CountdownClock {
    remaining: u32,
    armed: bool,
}

impl CountdownClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a countdown from `seconds`, replacing any running one.
    pub fn start(&mut self, seconds: u32) {
        self.clear();
        self.remaining = seconds;
        self.armed = true;
    }

    /// Halt the countdown. `remaining` keeps its last value.
    pub fn clear(&mut self) {
        self.armed = false;
    }

    /// Halt the countdown and zero `remaining`.
    pub fn reset(&mut self) {
        self.armed = false;
        self.remaining = 0;
    }

    pub fn tick(&mut self) -> ClockTick {
        if !self.armed {
            return ClockTick::Idle;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.armed = false;
            return ClockTick::Expired;
        }
        self.remaining -= 1;
        ClockTick::Counting(self.remaining)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.armed
    }
}
