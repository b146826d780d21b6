//! TOML-based application configuration.
//!
//! Stores the audio setup of the player:
//! - Which platform profile to use (settling delay, gesture unlock)
//! - How to chime on stretch transitions
//! - Which text-to-speech program announces stretches, and how fast
//!
//! Configuration is stored at `~/.config/stretchroom/config.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::audio::{
    ChimePlayer, ChimeSound, CommandAnnouncer, CueSequencer, PlatformProfile, RodioChime,
    SilentAnnouncer, SilentChime, SpeechAnnouncer,
};
use crate::error::{ConfigError, CoreError, Result};

/// Platform selection, with optional per-field overrides of the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// `native` or `browser`.
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub settling_delay_ms: Option<u64>,
    #[serde(default)]
    pub requires_gesture_unlock: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChimeKind {
    /// The generated two-tone chime.
    Tone,
    /// The file named by `chime.sound`.
    Sound,
    Silent,
}

/// Chime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default = "default_chime_kind")]
    pub kind: ChimeKind,
    /// Sound file for `kind = "sound"`.
    #[serde(default)]
    pub sound: Option<String>,
    /// Percent, 0 to 100.
    #[serde(default = "default_volume")]
    pub volume: u8,
}

/// Speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_speech_program")]
    pub program: String,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
    #[serde(default)]
    pub voice: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/stretchroom/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub chime: ChimeConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

// Default functions
fn default_profile() -> String {
    "native".into()
}
fn default_chime_kind() -> ChimeKind {
    ChimeKind::Tone
}
fn default_volume() -> u8 {
    100
}
fn default_speech_program() -> String {
    CommandAnnouncer::default_program().into()
}
fn default_words_per_minute() -> u32 {
    CommandAnnouncer::DEFAULT_WORDS_PER_MINUTE
}
fn default_true() -> bool {
    true
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            settling_delay_ms: None,
            requires_gesture_unlock: None,
        }
    }
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            kind: default_chime_kind(),
            sound: None,
            volume: default_volume(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_speech_program(),
            words_per_minute: default_words_per_minute(),
            voice: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    _ if value.eq_ignore_ascii_case("none") && is_optional(key) => {
                        serde_json::Value::Null
                    }
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    // Unset optional: type it from the text.
                    serde_json::Value::Null => parse_untyped(value),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Config>(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::path()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.platform_profile()?;
        *self = updated;
        Ok(())
    }

    /// The platform preset with any overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if `platform.profile` names no known preset.
    pub fn platform_profile(&self) -> Result<PlatformProfile, ConfigError> {
        let mut profile =
            PlatformProfile::preset(&self.platform.profile).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "platform.profile".into(),
                    message: format!(
                        "unknown profile '{}', expected 'native' or 'browser'",
                        self.platform.profile
                    ),
                }
            })?;
        if let Some(delay) = self.platform.settling_delay_ms {
            profile.settling_delay_ms = delay;
        }
        if let Some(unlock) = self.platform.requires_gesture_unlock {
            profile.requires_gesture_unlock = unlock;
        }
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns an error if `chime.kind` is `sound` without a `chime.sound`.
    pub fn chime_player(&self) -> Result<Arc<dyn ChimePlayer>, ConfigError> {
        let sound = match self.chime.kind {
            ChimeKind::Silent => return Ok(Arc::new(SilentChime)),
            ChimeKind::Tone => ChimeSound::Tone,
            ChimeKind::Sound => {
                let path = self.chime.sound.as_deref().ok_or_else(|| {
                    ConfigError::InvalidValue {
                        key: "chime.sound".into(),
                        message: "required when chime.kind is 'sound'".into(),
                    }
                })?;
                ChimeSound::File(path.into())
            }
        };
        let volume = f32::from(self.chime.volume.min(100)) / 100.0;
        Ok(Arc::new(RodioChime::new(sound).with_volume(volume)))
    }

    pub fn speech_announcer(&self) -> Arc<dyn SpeechAnnouncer> {
        if !self.speech.enabled {
            return Arc::new(SilentAnnouncer);
        }
        Arc::new(
            CommandAnnouncer::new(self.speech.program.clone())
                .with_rate(self.speech.words_per_minute)
                .with_voice(self.speech.voice.clone()),
        )
    }

    /// Build the cue sequencer this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform or chime settings are invalid.
    pub fn cue_sequencer(&self) -> Result<CueSequencer, CoreError> {
        Ok(CueSequencer::new(
            self.chime_player()?,
            self.speech_announcer(),
            self.platform_profile()?,
        ))
    }
}

fn is_optional(key: &str) -> bool {
    matches!(
        key,
        "platform.settling_delay_ms"
            | "platform.requires_gesture_unlock"
            | "chime.sound"
            | "speech.voice"
    )
}

fn parse_untyped(value: &str) -> serde_json::Value {
    if let Ok(n) = value.parse::<u64>() {
        serde_json::Value::Number(n.into())
    } else if let Ok(b) = value.parse::<bool>() {
        serde_json::Value::Bool(b)
    } else {
        serde_json::Value::String(value.into())
    }
}
