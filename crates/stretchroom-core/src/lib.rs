//! # Stretchroom Core Library
//!
//! This library provides the playback logic for Stretchroom stretching
//! routines. Routines are authored and stored elsewhere; this crate takes an
//! ordered list of timed stretches and plays it back with a countdown,
//! a chime on every transition and a spoken announcement of each stretch.
//!
//! ## Architecture
//!
//! - **Countdown Clock**: a caller-driven one-second countdown that reports
//!   its expiry exactly once
//! - **Playback Engine**: the `idle / playing / paused / finished` state
//!   machine that drives the clock and sequences audio cues
//! - **Audio**: injected chime and speech collaborators, plus the platform
//!   profile that decides whether speech waits for the chime to settle
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PlaybackEngine`]: Core playback state machine
//! - [`CountdownClock`]: Countdown driven by `tick()`
//! - [`CueSequencer`]: Chime-then-speech ordering per platform
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod error;
pub mod events;
pub mod player;
pub mod storage;
pub mod stretch;

pub use audio::{
    ChimePlayer, ChimeSound, CommandAnnouncer, CueSequencer, PlatformProfile, RodioChime,
    SilentAnnouncer, SilentChime, SpeechAnnouncer, SpeechHandle, SpeechOutcome,
};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::{Event, TransitionCause};
pub use player::{ClockTick, CountdownClock, PlayState, PlaybackEngine};
pub use storage::Config;
pub use stretch::{format_countdown, load_routine, sorted_stretches, MediaType, Routine, Stretch};
