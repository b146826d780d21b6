//! Audio side effects of playback.
//!
//! The engine never talks to a sound stack directly. It is handed a
//! [`ChimePlayer`] and a [`SpeechAnnouncer`] for the target environment and a
//! [`PlatformProfile`] describing that environment's quirks; [`CueSequencer`]
//! combines the three.

mod chime;
mod cue;
mod platform;
mod speech;

pub use chime::{chime_samples, AudioError, ChimePlayer, ChimeSound, RodioChime, SilentChime};
pub use cue::CueSequencer;
pub use platform::PlatformProfile;
pub use speech::{CommandAnnouncer, SilentAnnouncer, SpeechAnnouncer, SpeechHandle, SpeechOutcome};
