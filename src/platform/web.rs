//! Browser timers and storage
//!
//! Timers are RAII guards: dropping a guard cancels the browser timer, so a
//! torn-down game view can never leave a frame loop or interval behind.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::ReportError;

/// High-resolution time (ms since page load), 0 if unavailable
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
}

pub fn storage_get(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok()?
}

pub fn storage_set(key: &str, value: &str) -> Result<(), ReportError> {
    let storage = local_storage().ok_or(ReportError::StorageUnavailable)?;
    storage
        .set_item(key, value)
        .map_err(|e| ReportError::Write(format!("{:?}", e)))
}

/// Repeating `setInterval` timer, cleared on drop
pub struct Interval {
    handle: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(period_ms: u32, callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let closure = Closure::<dyn FnMut()>::new(callback);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms as i32,
        )?;
        Ok(Self {
            handle,
            _closure: closure,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

struct FrameLoopInner {
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    pending: Cell<Option<i32>>,
}

impl FrameLoopInner {
    fn request(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = self.closure.borrow();
        if let Some(closure) = closure.as_ref() {
            match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                Ok(handle) => self.pending.set(Some(handle)),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
        }
    }

    fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
    }
}

/// Self-rescheduling `requestAnimationFrame` loop
///
/// The callback returns whether another frame is wanted. Stopping or dropping
/// the loop cancels the pending frame.
pub struct FrameLoop {
    inner: Rc<FrameLoopInner>,
}

impl FrameLoop {
    pub fn new(mut on_frame: impl FnMut(f64) -> bool + 'static) -> Self {
        let inner = Rc::new(FrameLoopInner {
            closure: RefCell::new(None),
            pending: Cell::new(None),
        });
        let weak: Weak<FrameLoopInner> = Rc::downgrade(&inner);
        let closure = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            if on_frame(time) {
                inner.request();
            }
        });
        *inner.closure.borrow_mut() = Some(closure);
        Self { inner }
    }

    /// Request a frame unless one is already pending
    pub fn start(&self) {
        self.inner.request();
    }

    pub fn stop(&self) {
        self.inner.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}
