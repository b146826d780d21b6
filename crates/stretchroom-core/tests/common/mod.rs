//! Recording test doubles for the audio collaborators.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use stretchroom_core::{
    ChimePlayer, CueSequencer, PlatformProfile, SpeechAnnouncer, SpeechHandle, SpeechOutcome,
    Stretch,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Chime,
    Unlock,
    Speak(String),
    StopSpeech,
}

/// Shared log that both doubles append to, so ordering across them is visible.
#[derive(Debug, Clone, Default)]
pub struct CueLog(Arc<Mutex<Vec<Cue>>>);

impl CueLog {
    pub fn entries(&self) -> Vec<Cue> {
        self.0.lock().unwrap().clone()
    }

    /// Entries minus speech stops, which every announcement and teardown add.
    pub fn audible(&self) -> Vec<Cue> {
        self.entries()
            .into_iter()
            .filter(|c| *c != Cue::StopSpeech)
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn push(&self, cue: Cue) {
        self.0.lock().unwrap().push(cue);
    }
}

pub struct RecordingChime(pub CueLog);

impl ChimePlayer for RecordingChime {
    fn play(&self) {
        self.0.push(Cue::Chime);
    }

    fn unlock(&self) {
        self.0.push(Cue::Unlock);
    }
}

pub struct RecordingAnnouncer(pub CueLog);

impl SpeechAnnouncer for RecordingAnnouncer {
    fn speak(&self, text: &str) -> SpeechHandle {
        self.0.push(Cue::Speak(text.to_string()));
        SpeechHandle::resolved(SpeechOutcome::Done)
    }

    fn stop(&self) {
        self.0.push(Cue::StopSpeech);
    }
}

pub fn recording_cues(profile: PlatformProfile) -> (CueLog, CueSequencer) {
    let log = CueLog::default();
    let cues = CueSequencer::new(
        Arc::new(RecordingChime(log.clone())),
        Arc::new(RecordingAnnouncer(log.clone())),
        profile,
    );
    (log, cues)
}

pub fn speak(text: &str) -> Cue {
    Cue::Speak(text.to_string())
}

/// Stretches named by `(name, seconds)` in list order.
pub fn stretches(entries: &[(&str, u32)]) -> Vec<Stretch> {
    entries.iter()
        .enumerate()
        .map(|(i, (name, secs))| Stretch::new(*name, *secs, i as i64))
        .collect()
}
