//! Browser glue
//!
//! - `frame_loop`: cancellable requestAnimationFrame driver
//! - `hands`: camera + MediaPipe Hands bridge feeding a `TrackingSlot`

pub mod frame_loop;
pub mod hands;

pub use frame_loop::FrameLoop;
pub use hands::start_hand_tracking;
