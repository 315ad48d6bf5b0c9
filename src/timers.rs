use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Shared stop flag for timers and frame loops that would otherwise run
/// for the lifetime of the page.
#[derive(Clone, Default)]
pub struct CancelGuard(Rc<Cell<bool>>);

impl CancelGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// A fired-and-forgotten timeout that can still be cleared by id.
pub struct PendingTimeout {
    id: Option<i32>,
}

impl PendingTimeout {
    pub fn cancel(self) {
        if let (Some(id), Some(window)) = (self.id, web_sys::window()) {
            window.clear_timeout_with_handle(id);
        }
    }
}

/// Runs `callback` after `millis` unless `guard` was cancelled first.
pub fn after<F>(millis: u32, guard: &CancelGuard, callback: F) -> PendingTimeout
where
    F: FnOnce() + 'static,
{
    let guard = guard.clone();
    let id = Timeout::new(millis, move || {
        if !guard.is_cancelled() {
            callback();
        }
    })
    .forget();

    PendingTimeout {
        id: id.as_f64().map(|v| v as i32),
    }
}

/// Calls `step` once per animation frame until it returns `false` or the
/// guard is cancelled.
pub fn frame_loop<F>(guard: &CancelGuard, mut step: F)
where
    F: FnMut() -> bool + 'static,
{
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let guard = guard.clone();

    *g.borrow_mut() = Some(Closure::new(move || {
        if guard.is_cancelled() || !step() {
            // Break the self-reference so the closure is freed.
            let _ = f.borrow_mut().take();
            return;
        }
        if let Some(callback) = f.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }));

    if let Some(callback) = g.borrow().as_ref() {
        request_animation_frame(callback);
    };
}

fn request_animation_frame(callback: &Closure<dyn FnMut()>) {
    if let Some(window) = web_sys::window() {
        let _ = window.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clones_share_the_flag() {
        let guard = CancelGuard::new();
        let other = guard.clone();
        assert!(!other.is_cancelled());
        guard.cancel();
        assert!(other.is_cancelled());
    }
}
