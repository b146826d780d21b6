//! Spoken stretch announcements.
//!
//! `speak` hands back a [`SpeechHandle`] that always resolves: finishing,
//! being stopped and failing all end the same way for the caller, so
//! nothing waiting on an announcement can hang or observe an error.

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

/// How an announcement ended. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Done,
    Stopped,
    Errored,
}

/// Completion signal for one announcement.
#[derive(Debug)]
pub struct SpeechHandle {
    rx: oneshot::Receiver<SpeechOutcome>,
}

impl SpeechHandle {
    /// A handle plus the sender that resolves it. Dropping the sender
    /// resolves the handle as [`SpeechOutcome::Stopped`].
    pub fn pending() -> (oneshot::Sender<SpeechOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub fn resolved(outcome: SpeechOutcome) -> Self {
        let (tx, handle) = Self::pending();
        let _ = tx.send(outcome);
        handle
    }

    pub async fn finished(self) -> SpeechOutcome {
        self.rx.await.unwrap_or(SpeechOutcome::Stopped)
    }

    /// Block the current thread until the announcement ends.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> SpeechOutcome {
        self.rx.blocking_recv().unwrap_or(SpeechOutcome::Stopped)
    }
}

/// Speaks text aloud.
pub trait SpeechAnnouncer: Send + Sync {
    fn speak(&self, text: &str) -> SpeechHandle;

    /// Cancel all in-flight speech. Idempotent.
    fn stop(&self);
}

/// Speech disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAnnouncer;

impl SpeechAnnouncer for SilentAnnouncer {
    fn speak(&self, _text: &str) -> SpeechHandle {
        SpeechHandle::resolved(SpeechOutcome::Done)
    }

    fn stop(&self) {}
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Speaks through a system text-to-speech program (`say` or `espeak`).
///
/// Each utterance is a child process watched by its own thread. `stop`
/// bumps a generation counter; watchers started under an older generation
/// kill their child and resolve as stopped.
#[derive(Debug, Clone)]
pub struct CommandAnnouncer {
    program: String,
    words_per_minute: u32,
    voice: Option<String>,
    generation: Arc<AtomicU64>,
}

impl CommandAnnouncer {
    /// 0.9 of the usual 175 wpm default.
    pub const DEFAULT_WORDS_PER_MINUTE: u32 = 157;

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            words_per_minute: Self::DEFAULT_WORDS_PER_MINUTE,
            voice: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_rate(mut self, words_per_minute: u32) -> Self {
        self.words_per_minute = words_per_minute;
        self
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    pub fn default_program() -> &'static str {
        if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak"
        }
    }

    /// Command line arguments for speaking `text`.
    ///
    /// `say` and `espeak` disagree on the rate flag; espeak defaults to US English.
    pub fn args(&self, text: &str) -> Vec<String> {
        let is_say = self
            .program
            .rsplit(['/', '\\'])
            .next()
            .is_some_and(|name| name == "say");
        let mut args = Vec::new();
        if is_say {
            args.push("-r".to_string());
        } else {
            args.push("-s".to_string());
        }
        args.push(self.words_per_minute.to_string());
        match (&self.voice, is_say) {
            (Some(voice), _) => {
                args.push("-v".into());
                args.push(voice.clone());
            }
            (None, false) => {
                args.push("-v".into());
                args.push("en-us".into());
            }
            (None, true) => {}
        }
        if !is_say {
            args.push("--".into());
        }
        args.push(text.to_string());
        args
    }
}

impl SpeechAnnouncer for CommandAnnouncer {
    fn speak(&self, text: &str) -> SpeechHandle {
        let (tx, handle) = SpeechHandle::pending();
        let started_in = self.generation.load(Ordering::SeqCst);

        let child = Command::new(&self.program)
            .args(self.args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "speech program failed to start");
                let _ = tx.send(SpeechOutcome::Errored);
                return handle;
            }
        };

        let generation = Arc::clone(&self.generation);
        let watcher = std::thread::Builder::new()
            .name("speech-watch".into())
            .spawn(move || {
                let _ = tx.send(watch(&mut child, &generation, started_in));
            });
        if let Err(e) = watcher {
            // The sender went down with the closure, so the handle reads as stopped.
            tracing::warn!(error = %e, "could not watch speech process");
        }
        handle
    }

    fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `child` until it exits or the generation moves past `started_in`.
fn watch(child: &mut Child, generation: &AtomicU64, started_in: u64) -> SpeechOutcome {
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return SpeechOutcome::Done,
            Ok(Some(_)) | Err(_) => return SpeechOutcome::Errored,
            Ok(None) if generation.load(Ordering::SeqCst) != started_in => {
                let _ = child.kill();
                let _ = child.wait();
                return SpeechOutcome::Stopped;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espeak_args() {
        let tts = CommandAnnouncer::new("espeak");
        assert_eq!(tts.args("Neck roll"), ["-s", "157", "-v", "en-us", "--", "Neck roll"]);
    }

    #[test]
    fn say_args_with_voice() {
        let tts = CommandAnnouncer::new("/usr/bin/say")
            .with_rate(120)
            .with_voice(Some("Samantha".into()));
        assert_eq!(tts.args("Calf"), ["-r", "120", "-v", "Samantha", "Calf"]);
    }

    #[test]
    fn missing_program_resolves_as_errored() {
        let tts = CommandAnnouncer::new("definitely-not-a-tts-program");
        assert_eq!(tts.speak("hello").wait(), SpeechOutcome::Errored);
    }

    #[test]
    fn dropped_sender_resolves_as_stopped() {
        let (tx, handle) = SpeechHandle::pending();
        drop(tx);
        assert_eq!(handle.wait(), SpeechOutcome::Stopped);
    }

    #[test]
    fn silent_announcer_is_done_immediately() {
        SilentAnnouncer.stop();
        assert_eq!(SilentAnnouncer.speak("x").wait(), SpeechOutcome::Done);
    }

    #[cfg(unix)]
    #[test]
    fn watcher_kills_child_when_generation_moves() {
        let generation = Arc::new(AtomicU64::new(3));
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let bump = Arc::clone(&generation);
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            bump.fetch_add(1, Ordering::SeqCst);
        });
        let started = std::time::Instant::now();
        assert_eq!(watch(&mut child, &generation, 3), SpeechOutcome::Stopped);
        assert!(started.elapsed() < Duration::from_secs(2));
        stopper.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn watcher_reports_exit_status() {
        let generation = AtomicU64::new(0);
        let mut ok = Command::new("true").spawn().unwrap();
        assert_eq!(watch(&mut ok, &generation, 0), SpeechOutcome::Done);
        let mut failed = Command::new("false").spawn().unwrap();
        assert_eq!(watch(&mut failed, &generation, 0), SpeechOutcome::Errored);
    }
}
