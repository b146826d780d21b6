use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::PlayState;

/// What moved the player onto a new stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionCause {
    Play,
    Skip,
    /// The countdown for the previous stretch ran out.
    Expired,
    Back,
    Restart,
}

/// Every player state change produces an Event.
/// The host renders from them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StretchStarted {
        index: usize,
        stretch_id: String,
        name: String,
        duration_secs: u32,
        cause: TransitionCause,
        at: DateTime<Utc>,
    },
    Paused {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    Resumed {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    RoutineFinished {
        total: usize,
        at: DateTime<Utc>,
    },
    Stopped {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: PlayState,
        index: usize,
        total: usize,
        stretch_name: Option<String>,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
}
