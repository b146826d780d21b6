//! Transition chime.
//!
//! A chime marks every move to a new stretch. Playing it must never fail
//! from the caller's point of view: a missing sound file or a blocked
//! output device just means no chime.

use std::f32::consts::TAU;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;

/// Plays a short non-verbal cue.
pub trait ChimePlayer: Send + Sync {
    /// Start the chime. Returns once playback has been initiated.
    fn play(&self);

    /// Prepare the output from inside a user gesture. Most backends need nothing.
    fn unlock(&self) {}

    /// Release whatever `play` acquired. A later `play` may acquire it again.
    fn dispose(&self) {}
}

/// No audio at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentChime;

impl ChimePlayer for SilentChime {
    fn play(&self) {}
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Output(String),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("Failed to open sound file: {0}")]
    Io(#[from] std::io::Error),
}

pub const CHIME_SAMPLE_RATE: u32 = 44_100;
const CHIME_SECONDS: f32 = 0.6;

/// Mono samples of the two-tone chime: 880 Hz with a softer 1320 Hz
/// overtone under an `exp(-5t)` decay, 0.6 s long.
pub fn chime_samples(sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let len = (rate * CHIME_SECONDS) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / rate;
            let envelope = (-5.0 * t).exp();
            envelope * 0.3 * ((TAU * 880.0 * t).sin() + 0.6 * (TAU * 1320.0 * t).sin())
        })
        .collect()
}

/// What [`RodioChime`] plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChimeSound {
    /// The generated two-tone chime.
    Tone,
    /// A decoded sound file (wav, ogg vorbis or mp3). Falls back to the tone
    /// when the file cannot be opened or decoded.
    File(PathBuf),
}

/// Plays the chime on the default output device.
///
/// The output stream cannot leave the thread that opened it, so it lives on
/// a dedicated thread fed through a channel. That thread is started on the
/// first `play` (or `unlock`) and ends when `dispose` drops the sender.
#[derive(Debug)]
pub struct RodioChime {
    sound: ChimeSound,
    volume: f32,
    output: Mutex<Option<mpsc::Sender<()>>>,
    warned: AtomicBool,
}

impl RodioChime {
    pub fn new(sound: ChimeSound) -> Self {
        Self {
            sound,
            volume: 1.0,
            output: Mutex::new(None),
            warned: AtomicBool::new(false),
        }
    }

    /// Volume from 0.0 (mute) to 1.0 (full).
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn sound(&self) -> &ChimeSound {
        &self.sound
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn is_open(&self) -> bool {
        self.output.lock().map(|o| o.is_some()).unwrap_or(false)
    }

    /// Opens the output if needed and returns whether it is usable.
    fn ensure_open(&self, output: &mut Option<mpsc::Sender<()>>) -> bool {
        if output.is_some() {
            return true;
        }
        match open_output(self.sound.clone(), self.volume) {
            Ok(sender) => {
                *output = Some(sender);
                true
            }
            Err(e) => {
                if self.warned.swap(true, Ordering::Relaxed) {
                    tracing::debug!(error = %e, "chime skipped");
                } else {
                    tracing::warn!(error = %e, "no audio output, chime skipped");
                }
                false
            }
        }
    }
}

impl ChimePlayer for RodioChime {
    fn play(&self) {
        let Ok(mut output) = self.output.lock() else {
            return;
        };
        if !self.ensure_open(&mut output) {
            return;
        }
        let delivered = output.as_ref().is_some_and(|tx| tx.send(()).is_ok());
        if !delivered {
            // Output thread is gone; reopen on the next chime.
            *output = None;
        }
    }

    fn unlock(&self) {
        if let Ok(mut output) = self.output.lock() {
            self.ensure_open(&mut output);
        }
    }

    fn dispose(&self) {
        if let Ok(mut output) = self.output.lock() {
            if output.take().is_some() {
                tracing::debug!("chime output closed");
            }
        }
    }
}

/// Start the output thread and wait until it has opened the device.
fn open_output(sound: ChimeSound, volume: f32) -> Result<mpsc::Sender<()>, AudioError> {
    let (tx, rx) = mpsc::channel::<()>();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    std::thread::Builder::new()
        .name("chime-output".into())
        .spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => {
                    let _ = ready_tx.send(Ok(()));
                    pair
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let tone = chime_samples(CHIME_SAMPLE_RATE);
            while rx.recv().is_ok() {
                if let Err(e) = ring(&handle, &sound, &tone, volume) {
                    tracing::debug!(error = %e, "chime failed");
                }
            }
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(tx),
        Ok(Err(message)) => Err(AudioError::Output(message)),
        Err(_) => Err(AudioError::Output("output thread exited".into())),
    }
}

fn ring(
    handle: &OutputStreamHandle,
    sound: &ChimeSound,
    tone: &[f32],
    volume: f32,
) -> Result<(), AudioError> {
    let sink = Sink::try_new(handle)?;
    sink.set_volume(volume);
    match sound {
        ChimeSound::File(path) => match decode(path) {
            Ok(source) => sink.append(source),
            Err(e) => {
                tracing::warn!(sound = %path.display(), error = %e, "chime sound unusable, playing tone");
                sink.append(SamplesBuffer::new(1, CHIME_SAMPLE_RATE, tone.to_vec()));
            }
        },
        ChimeSound::Tone => sink.append(SamplesBuffer::new(1, CHIME_SAMPLE_RATE, tone.to_vec())),
    }
    // Let it finish on its own so overlapping chimes stay independent.
    sink.detach();
    Ok(())
}

fn decode(path: &std::path::Path) -> Result<Decoder<BufReader<File>>, AudioError> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_decays_from_silence() {
        let samples = chime_samples(CHIME_SAMPLE_RATE);
        assert_eq!(samples.len(), 26_460);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.3 * 1.6));

        let peak = |range: std::ops::Range<usize>| {
            samples[range].iter().fold(0.0f32, |m, s| m.max(s.abs()))
        };
        assert!(peak(0..4_410) > 0.2);
        assert!(peak(22_050..26_460) < peak(0..4_410) / 5.0);
    }

    #[test]
    fn tone_length_follows_sample_rate() {
        assert_eq!(chime_samples(22_050).len(), 13_230);
    }

    #[test]
    fn missing_sound_file_is_a_decode_error() {
        assert!(matches!(
            decode(std::path::Path::new("/nonexistent/chime.wav")),
            Err(AudioError::Io(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("chime.wav");
        std::fs::write(&garbage, b"RIFF").unwrap();
        assert!(decode(&garbage).is_err());
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(RodioChime::new(ChimeSound::Tone).with_volume(3.0).volume(), 1.0);
        assert_eq!(RodioChime::new(ChimeSound::Tone).with_volume(-1.0).volume(), 0.0);
    }

    #[test]
    fn output_is_opened_lazily_and_released_on_dispose() {
        let chime = RodioChime::new(ChimeSound::Tone);
        assert!(!chime.is_open());

        // With or without an output device this must not panic.
        chime.play();
        chime.play();
        chime.dispose();
        assert!(!chime.is_open());

        chime.unlock();
        chime.dispose();
        assert!(!chime.is_open());
    }

    #[test]
    fn silent_never_panics() {
        SilentChime.play();
        SilentChime.unlock();
        SilentChime.dispose();
    }
}
