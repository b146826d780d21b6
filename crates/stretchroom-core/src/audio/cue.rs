use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::chime::{ChimePlayer, SilentChime};
use super::platform::PlatformProfile;
use super::speech::{SilentAnnouncer, SpeechAnnouncer, SpeechHandle};

/// Orders the chime and the announcement for one stretch transition.
///
/// The chime always goes first. On platforms with a settling delay the
/// announcement follows on a short-lived thread after the delay, so the
/// caller is never blocked. Everything here is fire-and-forget.
pub struct CueSequencer {
    chime: Arc<dyn ChimePlayer>,
    speech: Arc<dyn SpeechAnnouncer>,
    profile: PlatformProfile,
    /// Bumped by `silence`; delayed announcements from an older generation are dropped.
    generation: Arc<AtomicU64>,
}

impl CueSequencer {
    pub fn new(
        chime: Arc<dyn ChimePlayer>,
        speech: Arc<dyn SpeechAnnouncer>,
        profile: PlatformProfile,
    ) -> Self {
        Self {
            chime,
            speech,
            profile,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// No chime, no speech.
    pub fn silent() -> Self {
        Self::new(
            Arc::new(SilentChime),
            Arc::new(SilentAnnouncer),
            PlatformProfile::native(),
        )
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    /// Chime, then (unless `speak` is false) announce `text`.
    ///
    /// A new announcement cuts off the previous one, whether it is still
    /// being spoken or still waiting to settle.
    pub fn cue(&self, text: &str, speak: bool) {
        if speak {
            self.silence();
        }
        self.chime.play();
        if !speak {
            return;
        }
        if self.profile.settling_delay_ms == 0 {
            drop(self.speech.speak(text));
            return;
        }

        let delay = Duration::from_millis(self.profile.settling_delay_ms);
        let speech = Arc::clone(&self.speech);
        let generation = Arc::clone(&self.generation);
        let issued_in = generation.load(Ordering::SeqCst);
        let text = text.to_owned();
        let spawned = std::thread::Builder::new()
            .name("cue-settle".into())
            .spawn(move || {
                std::thread::sleep(delay);
                if generation.load(Ordering::SeqCst) == issued_in {
                    drop(speech.speak(&text));
                } else {
                    tracing::debug!(text = %text, "announcement cancelled before settling");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not schedule announcement");
        }
    }

    /// Speak immediately on the caller's thread, skipping the chime and the delay.
    pub fn speak_now(&self, text: &str) -> SpeechHandle {
        self.speech.speak(text)
    }

    pub fn unlock(&self) {
        self.chime.unlock();
    }

    /// Stop current speech and drop announcements still waiting to settle.
    pub fn silence(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.speech.stop();
    }

    pub fn dispose(&self) {
        self.silence();
        self.chime.dispose();
    }
}

impl std::fmt::Debug for CueSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueSequencer")
            .field("profile", &self.profile)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for CueSequencer {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::audio::SpeechOutcome;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl ChimePlayer for Log {
        fn play(&self) {
            self.0.lock().unwrap().push("chime".into());
        }
    }

    impl SpeechAnnouncer for Log {
        fn speak(&self, text: &str) -> SpeechHandle {
            self.0.lock().unwrap().push(format!("speak:{text}"));
            SpeechHandle::resolved(SpeechOutcome::Done)
        }

        fn stop(&self) {
            self.0.lock().unwrap().push("stop".into());
        }
    }

    fn sequencer(delay_ms: u64) -> (Arc<Log>, CueSequencer) {
        let log = Arc::new(Log::default());
        let profile = PlatformProfile {
            settling_delay_ms: delay_ms,
            requires_gesture_unlock: false,
        };
        let cues = CueSequencer::new(log.clone(), log.clone(), profile);
        (log, cues)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.0.lock().unwrap().clone()
    }

    #[test]
    fn native_speaks_right_after_chime() {
        let (log, cues) = sequencer(0);
        cues.cue("Hamstring", true);
        assert_eq!(entries(&log), ["stop", "chime", "speak:Hamstring"]);
    }

    #[test]
    fn suppressed_announcement_still_chimes() {
        let (log, cues) = sequencer(0);
        cues.cue("Hamstring", false);
        assert_eq!(entries(&log), ["chime"]);
    }

    #[test]
    fn delayed_speech_waits_for_settling() {
        let (log, cues) = sequencer(40);
        cues.cue("Quad", true);
        assert_eq!(entries(&log), ["stop", "chime"]);
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(entries(&log), ["stop", "chime", "speak:Quad"]);
    }

    #[test]
    fn silence_cancels_pending_announcement() {
        let (log, cues) = sequencer(80);
        cues.cue("Quad", true);
        cues.silence();
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(entries(&log), ["stop", "chime", "stop"]);
    }

    #[test]
    fn next_cue_replaces_settling_announcement() {
        let (log, cues) = sequencer(80);
        cues.cue("Quad", true);
        cues.cue("Calf", true);
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(entries(&log), ["stop", "chime", "stop", "chime", "speak:Calf"]);
    }

    #[test]
    fn chime_only_cue_leaves_speech_alone() {
        let (log, cues) = sequencer(0);
        cues.cue("Quad", true);
        cues.cue("Quad", false);
        assert_eq!(entries(&log), ["stop", "chime", "speak:Quad", "chime"]);
    }
}
