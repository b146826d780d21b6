//! Routine and stretch data model.
//!
//! Routines are owned by the document store; this module only reads them.
//! The playback engine works on a sorted snapshot produced by
//! [`sorted_stretches`], never on the caller's list.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Media attached to a stretch for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Gif,
    Video,
}

/// One timed exercise step within a routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stretch {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(alias = "durationSeconds")]
    pub duration_seconds: u32,
    #[serde(default, alias = "mediaUrl")]
    pub media_url: Option<String>,
    #[serde(default, alias = "mediaType")]
    pub media_type: Option<MediaType>,
    /// Display hint: the stretch is done once per side.
    #[serde(default, alias = "switchSides")]
    pub switch_sides: bool,
    #[serde(default)]
    pub order: i64,
}

impl Stretch {
    pub fn new(name: impl Into<String>, duration_seconds: u32, order: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            duration_seconds,
            media_url: None,
            media_type: None,
            switch_sides: false,
            order,
        }
    }
}

/// A named, colored, ordered collection of stretches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub stretches: Vec<Stretch>,
}

fn default_color() -> String {
    "#4A90D9".into()
}

impl Routine {
    /// Check the fields the authoring form enforces.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "routine name must not be empty".into(),
            });
        }
        for (i, stretch) in self.stretches.iter().enumerate() {
            if stretch.name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("stretches[{i}].name"),
                    message: "stretch name must not be empty".into(),
                });
            }
            if stretch.duration_seconds == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("stretches[{i}].duration_seconds"),
                    message: "duration must be at least one second".into(),
                });
            }
        }
        Ok(())
    }

    /// Give every stretch without an id a fresh UUID.
    pub fn fill_missing_ids(&mut self) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        for stretch in self.stretches.iter_mut().filter(|s| s.id.is_empty()) {
            stretch.id = uuid::Uuid::new_v4().to_string();
        }
    }

    pub fn sorted(&self) -> Vec<Stretch> {
        sorted_stretches(&self.stretches)
    }

    /// Sum of all stretch durations.
    pub fn total_seconds(&self) -> u64 {
        self.stretches
            .iter()
            .map(|s| u64::from(s.duration_seconds))
            .sum()
    }
}

/// Copy of `stretches` sorted ascending by `order`.
///
/// `sort_by_key` is stable, so ties keep their input order.
pub fn sorted_stretches(stretches: &[Stretch]) -> Vec<Stretch> {
    let mut sorted = stretches.to_vec();
    sorted.sort_by_key(|s| s.order);
    sorted
}

/// Read a routine document from a `.json` or `.toml` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, has an
/// unsupported extension, or fails [`Routine::validate`].
pub fn load_routine(path: &Path) -> Result<Routine> {
    let content = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut routine: Routine = match ext.as_str() {
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ValidationError::UnsupportedFormat(other.to_string()).into()),
    };
    routine.fill_missing_ids();
    routine.validate()?;
    tracing::debug!(
        routine = %routine.name,
        stretches = routine.stretches.len(),
        "loaded routine"
    );
    Ok(routine)
}

/// Render seconds the way the player screen shows them: `m:ss` once a
/// minute or more remains, bare seconds below that.
pub fn format_countdown(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    if mins > 0 {
        format!("{mins}:{secs:02}")
    } else {
        secs.to_string()
    }
}
