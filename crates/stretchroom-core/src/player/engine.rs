//! Playback engine implementation.
//!
//! The engine walks a routine's stretches in order, one countdown per
//! stretch. Like the clock it owns, it has no thread: the host calls
//! `tick()` once per second and forwards user commands as they arrive.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Playing <-> Paused
//!            |
//!            v
//!         Finished -> Playing (play / restart / back)
//! any -> Idle (stop)
//! ```
//!
//! Running out of time on a stretch and pressing skip go through the same
//! `advance` path, so they produce the same cues and the same state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PlaybackEngine::new(&routine.stretches, cues);
//! engine.play(false);
//! // Once per second:
//! engine.tick(); // Some(Event) when the player moves on
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{ClockTick, CountdownClock};
use crate::audio::{CueSequencer, PlatformProfile};
use crate::events::{Event, TransitionCause};
use crate::stretch::{sorted_stretches, Stretch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Idle,
    Playing,
    Paused,
    /// Ran past the last stretch. Stays here until played again or stopped.
    Finished,
}

type FinishCallback = Box<dyn FnMut() + Send>;

/// Core playback engine.
///
/// Holds a sorted snapshot of the routine, never the caller's list.
pub struct PlaybackEngine {
    stretches: Vec<Stretch>,
    state: PlayState,
    current_index: usize,
    clock: CountdownClock,
    cues: CueSequencer,
    on_finish: Option<FinishCallback>,
}

impl PlaybackEngine {
    /// Create an idle engine for `stretches`, sorted by their `order`.
    pub fn new(stretches: &[Stretch], cues: CueSequencer) -> Self {
        Self {
            stretches: sorted_stretches(stretches),
            state: PlayState::Idle,
            current_index: 0,
            clock: CountdownClock::new(),
            cues,
            on_finish: None,
        }
    }

    /// Run `f` every time the routine finishes.
    pub fn with_on_finish(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_stretch(&self) -> Option<&Stretch> {
        self.stretches.get(self.current_index)
    }

    pub fn total_count(&self) -> usize {
        self.stretches.len()
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.clock.remaining()
    }

    /// The sorted snapshot being played.
    pub fn stretches(&self) -> &[Stretch] {
        &self.stretches
    }

    pub fn profile(&self) -> PlatformProfile {
        self.cues.profile()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            index: self.current_index,
            total: self.total_count(),
            stretch_name: self.current_stretch().map(|s| s.name.clone()),
            seconds_remaining: self.seconds_remaining(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from the first stretch, or resume when paused.
    ///
    /// With `skip_announce` the first stretch is only chimed, for hosts that
    /// already spoke its name from a gesture handler.
    pub fn play(&mut self, skip_announce: bool) -> Option<Event> {
        if self.stretches.is_empty() {
            return None;
        }
        match self.state {
            PlayState::Playing => None,
            PlayState::Paused => {
                let remaining = self.clock.remaining();
                self.clock.start(remaining);
                self.state = PlayState::Playing;
                tracing::debug!(remaining, "resumed");
                Some(Event::Resumed {
                    seconds_remaining: remaining,
                    at: Utc::now(),
                })
            }
            PlayState::Idle | PlayState::Finished => {
                self.enter(0, TransitionCause::Play, !skip_announce)
            }
        }
    }

    /// Start playback from inside a user gesture.
    ///
    /// On platforms that gate speech behind a gesture, the first stretch is
    /// spoken right here, synchronously, and playback then starts without a
    /// second announcement. Elsewhere this is plain `play(false)`.
    pub fn gesture_start(&mut self) -> Option<Event> {
        let needs_unlock = self.cues.profile().requires_gesture_unlock
            && matches!(self.state, PlayState::Idle | PlayState::Finished);
        if !needs_unlock {
            return self.play(false);
        }
        let first = self.stretches.first()?.name.clone();
        self.cues.unlock();
        drop(self.cues.speak_now(&first));
        self.play(true)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != PlayState::Playing {
            return None;
        }
        self.clock.clear();
        self.state = PlayState::Paused;
        tracing::debug!(remaining = self.clock.remaining(), "paused");
        Some(Event::Paused {
            seconds_remaining: self.clock.remaining(),
            at: Utc::now(),
        })
    }

    /// Move to the next stretch, or finish after the last one.
    pub fn skip(&mut self) -> Option<Event> {
        if self.stretches.is_empty() || self.state == PlayState::Finished {
            return None;
        }
        self.advance(TransitionCause::Skip)
    }

    /// Go to the previous stretch. On the first stretch, start it over.
    pub fn back(&mut self) -> Option<Event> {
        if self.stretches.is_empty() {
            return None;
        }
        self.clock.clear();
        let index = self.current_index.saturating_sub(1);
        self.enter(index, TransitionCause::Back, true)
    }

    pub fn restart(&mut self) -> Option<Event> {
        if self.stretches.is_empty() {
            return None;
        }
        self.clock.clear();
        self.enter(0, TransitionCause::Restart, true)
    }

    /// End the session. Always lands in `Idle` at index 0 with no time left.
    pub fn stop(&mut self) -> Option<Event> {
        self.clock.reset();
        self.cues.silence();
        self.state = PlayState::Idle;
        self.current_index = 0;
        tracing::debug!("stopped");
        Some(Event::Stopped { at: Utc::now() })
    }

    /// Call once per elapsed second. Returns `Some(Event)` when the current
    /// stretch ran out and the player moved on or finished.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != PlayState::Playing {
            return None;
        }
        match self.clock.tick() {
            ClockTick::Expired => self.advance(TransitionCause::Expired),
            ClockTick::Counting(_) | ClockTick::Idle => None,
        }
    }

    /// Swap in a different routine. The current session is discarded.
    pub fn load_routine(&mut self, stretches: &[Stretch]) {
        self.stop();
        self.stretches = sorted_stretches(stretches);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn advance(&mut self, cause: TransitionCause) -> Option<Event> {
        self.clock.clear();
        if self.current_index + 1 < self.stretches.len() {
            self.enter(self.current_index + 1, cause, true)
        } else {
            Some(self.finish())
        }
    }

    /// Make `index` current: chime (+ announce), then arm its countdown.
    fn enter(&mut self, index: usize, cause: TransitionCause, announce: bool) -> Option<Event> {
        let stretch = self.stretches.get(index)?;
        let event = Event::StretchStarted {
            index,
            stretch_id: stretch.id.clone(),
            name: stretch.name.clone(),
            duration_secs: stretch.duration_seconds,
            cause,
            at: Utc::now(),
        };
        let duration = stretch.duration_seconds;

        self.current_index = index;
        self.state = PlayState::Playing;
        self.cues.cue(&stretch.name, announce);
        self.clock.start(duration);
        tracing::debug!(index, name = %stretch.name, duration, ?cause, "stretch started");
        Some(event)
    }

    fn finish(&mut self) -> Event {
        self.clock.reset();
        self.state = PlayState::Finished;
        tracing::debug!(total = self.stretches.len(), "routine finished");
        if let Some(on_finish) = self.on_finish.as_mut() {
            on_finish();
        }
        Event::RoutineFinished {
            total: self.stretches.len(),
            at: Utc::now(),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.clock.clear();
        self.cues.dispose();
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("current_index", &self.current_index)
            .field("seconds_remaining", &self.clock.remaining())
            .field("total", &self.stretches.len())
            .field("cues", &self.cues)
            .finish_non_exhaustive()
    }
}
