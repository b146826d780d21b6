use serde::{Deserialize, Serialize};

/// Audio capabilities of the environment the player runs in.
///
/// Chosen once when the engine is built. The state machine itself never
/// branches on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Pause between the chime and the announcement, in milliseconds.
    /// Browser audio and speech stacks garble each other when started together.
    pub settling_delay_ms: u64,
    /// Speech only works after a synchronous call from a user gesture.
    pub requires_gesture_unlock: bool,
}

impl PlatformProfile {
    pub const BROWSER_SETTLING_DELAY_MS: u64 = 800;

    /// Native sound stacks mix chime and speech fine.
    pub const fn native() -> Self {
        Self {
            settling_delay_ms: 0,
            requires_gesture_unlock: false,
        }
    }

    pub const fn browser() -> Self {
        Self {
            settling_delay_ms: Self::BROWSER_SETTLING_DELAY_MS,
            requires_gesture_unlock: true,
        }
    }

    /// Look up a preset by name (`native` or `browser`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "native" => Some(Self::native()),
            "browser" | "web" => Some(Self::browser()),
            _ => None,
        }
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::native()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(PlatformProfile::preset("native"), Some(PlatformProfile::native()));
        assert_eq!(PlatformProfile::preset("Web").unwrap().settling_delay_ms, 800);
        assert!(PlatformProfile::browser().requires_gesture_unlock);
        assert!(PlatformProfile::preset("toaster").is_none());
    }
}
