//! Player settings and preferences
//!
//! Persisted as JSON in LocalStorage. Missing fields fall back to defaults,
//! so settings saved by an older build still load.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::tracking::AggregatorConfig;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Camera ===
    /// Flip the camera image horizontally (selfie view)
    pub mirror_camera: bool,
    /// Draw the 21-point hand skeleton over the cursor
    pub show_skeleton: bool,

    // === Session ===
    /// Countdown length in seconds
    pub session_seconds: u32,
    /// Scales fast/calm gesture thresholds (1.0 = default, >1 = easier)
    pub gesture_sensitivity: f32,

    // === Audio ===
    pub sound: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    // === Accessibility ===
    /// Reduced motion (steady glow instead of the pulsing halo)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mirror_camera: true,
            show_skeleton: true,

            session_seconds: 60,
            gesture_sensitivity: 1.0,

            sound: true,
            master_volume: 0.8,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "star_sweep_settings";

    /// Parse stored JSON and clamp out-of-range values
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    fn sanitized(mut self) -> Self {
        self.session_seconds = self.session_seconds.clamp(10, 600);
        self.gesture_sensitivity = self.gesture_sensitivity.clamp(0.25, 4.0);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self
    }

    /// Effective volume (0 when sound is off)
    pub fn effective_volume(&self) -> f32 {
        if self.sound { self.master_volume } else { 0.0 }
    }

    /// Aggregator tuning implied by these settings
    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            mirror: self.mirror_camera,
            ..Default::default()
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No storage on native; {} uses defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let s = Settings::from_json(r#"{"sound": false}"#).unwrap();
        assert!(!s.sound);
        assert_eq!(s.session_seconds, 60);
        assert!(s.mirror_camera);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let s = Settings::from_json(r#"{"master_volume": 3.0, "session_seconds": 1}"#).unwrap();
        assert_eq!(s.master_volume, 1.0);
        assert_eq!(s.session_seconds, 10);
    }

    #[test]
    fn test_json_round_trip() {
        let s = Settings {
            show_skeleton: false,
            gesture_sensitivity: 1.5,
            ..Default::default()
        };
        let back = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            Settings::from_json("[1, 2"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_muted_volume_is_zero() {
        let s = Settings {
            sound: false,
            ..Default::default()
        };
        assert_eq!(s.effective_volume(), 0.0);
    }

    #[test]
    fn test_mirror_feeds_aggregator() {
        let s = Settings {
            mirror_camera: false,
            ..Default::default()
        };
        assert!(!s.aggregator().mirror);
        assert!(Settings::default().aggregator().mirror);
    }
}
