//! Shared controller state, event dispatch and the animation frame loop.

use crate::dom::DomSurface;
use crate::events::{Input, translate};
use js_sys::Function;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Event;
use zpd_core::animation::Instant;
use zpd_core::{Completion, MatrixSnapshot, NodeId, ZpdController};

pub(crate) type Controller = ZpdController<DomSurface>;

/// One controller plus everything that must live outside its borrow.
pub(crate) struct Runtime {
    controller: RefCell<Controller>,
    /// JS callbacks of finished transitions, called once the controller is released.
    finished: RefCell<Vec<(Function, MatrixSnapshot)>>,
    frame_pending: Cell<bool>,
}

impl Runtime {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            controller: RefCell::new(ZpdController::new(DomSurface::new(weak.clone()))),
            finished: RefCell::new(Vec::new()),
            frame_pending: Cell::new(false),
        })
    }

    /// Run `f` with the controller, failing if it is already borrowed.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> Result<R, JsValue> {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => Ok(f(&mut controller)),
            Err(_) => Err(JsValue::from_str("zpd: controller is busy")),
        }
    }

    /// Wrap a JS callback as a transition completion.
    pub fn completion(self: &Rc<Self>, callback: Option<Function>) -> Option<Completion> {
        let callback = callback?;
        let runtime = Rc::downgrade(self);
        Some(Box::new(move |matrix| {
            if let Some(runtime) = runtime.upgrade() {
                runtime.finished.borrow_mut().push((callback, matrix.into()));
            }
        }))
    }

    /// Feed a DOM event to the controller.
    pub fn dispatch(&self, canvas: NodeId, event: &Event) {
        let Ok(mut zpd) = self.controller.try_borrow_mut() else {
            log::debug!("Dropped {} while the controller is busy", event.type_());
            return;
        };
        let response = match translate(zpd.surface(), canvas, event) {
            Some(Input::Pointer(pointer)) => zpd.handle_pointer(canvas, &pointer),
            Some(Input::Touch(touch)) => zpd.handle_touch(canvas, &touch),
            None => return,
        };
        match response {
            Ok(response) if response.prevents_default() => event.prevent_default(),
            Ok(_) => {}
            Err(e) => log::error!("{} handler failed: {}", event.type_(), e),
        }
    }

    /// Schedule a frame unless one is already pending.
    pub fn request_frame(self: &Rc<Self>) {
        if self.frame_pending.replace(true) {
            return;
        }
        let Some(window) = web_sys::window() else {
            self.frame_pending.set(false);
            return;
        };
        let runtime = Rc::downgrade(self);
        let callback = Closure::once_into_js(move |_timestamp: f64| {
            if let Some(runtime) = runtime.upgrade() {
                runtime.on_frame();
            }
        });
        if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {:?}", e);
            self.frame_pending.set(false);
        }
    }

    fn on_frame(self: &Rc<Self>) {
        self.frame_pending.set(false);
        // Busy means an API call is in progress; try again next frame.
        let running = self.with(|zpd| zpd.tick(Instant::now())).unwrap_or(1);
        self.flush_callbacks();
        if running > 0 {
            self.request_frame();
        }
    }

    fn flush_callbacks(&self) {
        let ready = std::mem::take(&mut *self.finished.borrow_mut());
        for (callback, matrix) in ready {
            match serde_wasm_bindgen::to_value(&matrix) {
                Ok(value) => call_back(&callback, &value),
                Err(e) => log::error!("Could not convert {:?}: {}", matrix, e),
            }
        }
    }
}

/// Call a node-style `(err, value)` callback.
pub(crate) fn call_back(callback: &Function, value: &JsValue) {
    if let Err(e) = callback.call2(&JsValue::NULL, &JsValue::NULL, value) {
        log::error!("Callback threw: {:?}", e);
    }
}
