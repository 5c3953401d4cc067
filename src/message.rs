//! Closing message shown on the finished screen
//!
//! The page may provide an async text generator; without one (or when it
//! fails) the host falls back to a fixed line. `local_message` is the
//! offline generator used on native builds.

use crate::error::MessageError;
use crate::sim::GameMode;

/// Shown when the provider fails or returns nothing
pub const FALLBACK_MESSAGE: &str =
    "Every sweep of your hand left a little more light in the sky. Rest now, and come back whenever you like.";

/// Shown while the request is still in flight
pub const WAITING_MESSAGE: &str = "Listening for the echo of the stars...";

/// Request text for an external generator
pub fn closing_prompt(score: u64, mode: GameMode) -> String {
    let focus = match mode {
        GameMode::Adventure => "gathered drifting starlight",
        GameMode::Sequence => "traced the stars in order with calm focus",
        GameMode::Breathing => "released stress bubbles with slow, steady breaths",
        GameMode::MistClear => "swept the shadows away to guard the lantern's flame",
    };
    format!(
        "The player just finished a short motion-game session in which they {focus}, \
         scoring {score} points. Write one or two warm, encouraging sentences \
         (under 50 words) celebrating their effort and inviting them to breathe and rest."
    )
}

/// Deterministic closing line, tiered by score
pub fn local_message(score: u64, mode: GameMode) -> String {
    let tier = match score {
        0 => 0,
        1..=99 => 1,
        100..=299 => 2,
        _ => 3,
    };
    let opener = match tier {
        0 => "The sky waited patiently with you today.",
        1 => "A few bright sparks answered your hand.",
        2 => "The sky is noticeably brighter for your visit.",
        _ => "You filled the night with light.",
    };
    let closer = match mode {
        GameMode::Adventure => "Each star you gathered was a small, kind breath.",
        GameMode::Sequence => "Your focus drew the constellation back together.",
        GameMode::Breathing => "Let that slow rhythm stay with you a while.",
        GameMode::MistClear => "The lantern still glows because you guarded it.",
    };
    format!("{opener} {closer} ({score} points)")
}

/// Pick the text to display for a finished request
pub fn resolve(result: Result<String, MessageError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            log::warn!("Closing message was empty, using fallback");
            FALLBACK_MESSAGE.to_string()
        }
        Err(e) => {
            log::warn!("Closing message unavailable: {e}");
            FALLBACK_MESSAGE.to_string()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::request_message;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    use super::closing_prompt;
    use crate::error::MessageError;
    use crate::sim::GameMode;

    #[wasm_bindgen(inline_js = "
        export function has_message_provider() {
            return typeof window.starSweepMessage === 'function';
        }

        export function call_message_provider(score, mode, prompt) {
            try {
                return Promise.resolve(window.starSweepMessage(score, mode, prompt));
            } catch (e) {
                return Promise.reject(e);
            }
        }
    ")]
    extern "C" {
        fn has_message_provider() -> bool;
        fn call_message_provider(score: f64, mode: &str, prompt: &str) -> js_sys::Promise;
    }

    /// Ask the page's generator for a closing line
    pub async fn request_message(score: u64, mode: GameMode) -> Result<String, MessageError> {
        if !has_message_provider() {
            return Err(MessageError::Unavailable);
        }
        let prompt = closing_prompt(score, mode);
        let promise = call_message_provider(score as f64, mode.as_key(), &prompt);
        let value = JsFuture::from(promise).await.map_err(|e| {
            MessageError::Provider(e.as_string().unwrap_or_else(|| format!("{e:?}")))
        })?;
        let text = value.as_string().ok_or(MessageError::Empty)?;
        if text.trim().is_empty() {
            return Err(MessageError::Empty);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_score_and_mode() {
        let p = closing_prompt(120, GameMode::MistClear);
        assert!(p.contains("120"));
        assert!(p.contains("shadows"));
    }

    #[test]
    fn test_local_message_tiers() {
        assert_ne!(
            local_message(0, GameMode::Adventure),
            local_message(500, GameMode::Adventure)
        );
        assert!(local_message(42, GameMode::Sequence).contains("42"));
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(resolve(Err(MessageError::Unavailable)), FALLBACK_MESSAGE);
        assert_eq!(resolve(Ok("   ".into())), FALLBACK_MESSAGE);
        assert_eq!(resolve(Ok(" Well done. ".into())), "Well done.");
    }
}
