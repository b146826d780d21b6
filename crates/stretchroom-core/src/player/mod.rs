mod clock;
mod engine;

pub use clock::{ClockTick, CountdownClock};
pub use engine::{PlayState, PlaybackEngine};
