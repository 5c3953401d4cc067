//! requestAnimationFrame driver with a real cancellation handle

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[derive(Default)]
struct LoopInner {
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    /// Pending requestAnimationFrame id
    handle: Cell<Option<i32>>,
}

impl LoopInner {
    fn schedule(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = self.callback.borrow();
        if let Some(cb) = callback.as_ref() {
            match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => self.handle.set(Some(id)),
                Err(e) => log::error!("requestAnimationFrame failed: {e:?}"),
            }
        }
    }
}

/// Runs a callback once per display frame until it returns `false` or the
/// loop is cancelled. Dropping the loop cancels it.
#[derive(Default)]
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) with `tick`, which receives the frame timestamp in
    /// ms and returns whether to keep going. Must not be called from inside
    /// a running tick.
    pub fn start<F>(&self, mut tick: F)
    where
        F: FnMut(f64) -> bool + 'static,
    {
        self.cancel();

        let weak: Weak<LoopInner> = Rc::downgrade(&self.inner);
        let closure = Closure::<dyn FnMut(f64)>::new(move |ts: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.handle.set(None);
            if tick(ts) {
                inner.schedule();
            } else {
                log::debug!("Frame loop finished");
            }
        });
        *self.inner.callback.borrow_mut() = Some(closure);
        self.inner.schedule();
    }

    /// A frame is queued
    pub fn is_running(&self) -> bool {
        self.inner.handle.get().is_some()
    }

    /// Deregister the pending frame and release the callback. Safe to call
    /// when idle.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
            log::debug!("Frame loop cancelled");
        }
        self.inner.callback.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
