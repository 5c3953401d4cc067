//! Error types
//!
//! Hand loss is not an error (see `tracking::HandSample::is_visible`); only
//! failures the player or host has to react to live here.

use std::fmt;

/// Camera / hand-tracking startup failure. Fatal to starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// Camera permission was refused
    PermissionDenied,
    /// Hardware missing, busy, or the tracking model failed to load
    Unavailable(String),
    /// Tracking has not finished initializing yet
    NotReady,
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingError::PermissionDenied => {
                write!(f, "camera access was denied; allow the camera and retry")
            }
            TrackingError::Unavailable(reason) => {
                write!(f, "camera unavailable ({reason}); close other apps using it and retry")
            }
            TrackingError::NotReady => write!(f, "hand tracking is still starting"),
        }
    }
}

impl std::error::Error for TrackingError {}

/// Closing-message generation failure. Always recovered with a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// No provider configured on the page
    Unavailable,
    /// Provider answered with nothing usable
    Empty,
    /// Provider rejected or threw
    Provider(String),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Unavailable => write!(f, "no message provider available"),
            MessageError::Empty => write!(f, "message provider returned empty text"),
            MessageError::Provider(reason) => write!(f, "message provider failed: {reason}"),
        }
    }
}

impl std::error::Error for MessageError {}

/// Settings / tuning parse failure
#[derive(Debug)]
pub enum SettingsError {
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(e) => write!(f, "invalid settings json: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_error_display() {
        let e = TrackingError::Unavailable("NotReadableError".into());
        assert!(e.to_string().contains("NotReadableError"));
    }

    #[test]
    fn test_settings_error_from_json() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: SettingsError = err.into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
