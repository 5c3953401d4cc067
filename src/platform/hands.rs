//! Camera capture and MediaPipe Hands
//!
//! The page loads `@mediapipe/hands` and `@mediapipe/camera_utils` as
//! globals. Results land in a `TrackingSlot` on the provider's own cadence;
//! the frame loop only ever reads the latest one.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use crate::error::TrackingError;
use crate::tracking::TrackingSlot;

#[wasm_bindgen(inline_js = "
    let hands = null;

    export function tracking_available() {
        return typeof window.Hands === 'function' && typeof window.Camera === 'function';
    }

    export function start_hands(video, on_results) {
        if (!hands) {
            hands = new window.Hands({
                locateFile: (file) => `https://cdn.jsdelivr.net/npm/@mediapipe/hands/${file}`,
            });
            hands.setOptions({
                maxNumHands: 1,
                modelComplexity: 1,
                minDetectionConfidence: 0.6,
                minTrackingConfidence: 0.6,
            });
        }
        hands.onResults((results) => {
            const hand = results.multiHandLandmarks && results.multiHandLandmarks[0];
            if (!hand) {
                on_results(new Float32Array(0));
                return;
            }
            const flat = new Float32Array(hand.length * 2);
            hand.forEach((p, i) => {
                flat[i * 2] = p.x;
                flat[i * 2 + 1] = p.y;
            });
            on_results(flat);
        });
        const camera = new window.Camera(video, {
            onFrame: async () => {
                await hands.send({ image: video });
            },
            width: 640,
            height: 480,
        });
        return camera.start().catch((e) => {
            throw (e && e.name) ? `${e.name}: ${e.message}` : String(e);
        });
    }
")]
extern "C" {
    fn tracking_available() -> bool;
    fn start_hands(video: &HtmlVideoElement, on_results: &Closure<dyn FnMut(js_sys::Float32Array)>) -> js_sys::Promise;
}

fn classify(err: JsValue) -> TrackingError {
    let text = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    if text.starts_with("NotAllowedError") || text.starts_with("SecurityError") {
        TrackingError::PermissionDenied
    } else {
        TrackingError::Unavailable(text)
    }
}

/// Open the camera and start publishing hand landmarks into `slot`.
/// Resolves once the camera stream is live.
pub async fn start_hand_tracking(video: &HtmlVideoElement, slot: TrackingSlot) -> Result<(), TrackingError> {
    if !tracking_available() {
        return Err(TrackingError::Unavailable("MediaPipe Hands is not loaded".into()));
    }

    let on_results = Closure::<dyn FnMut(js_sys::Float32Array)>::new(move |flat: js_sys::Float32Array| {
        slot.publish_flat(&flat.to_vec());
    });
    let promise = start_hands(video, &on_results);
    // The provider keeps calling back for the lifetime of the page
    on_results.forget();

    JsFuture::from(promise).await.map_err(classify)?;
    log::info!("Camera stream live, hand tracking started");
    Ok(())
}
