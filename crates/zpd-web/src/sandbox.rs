//! Draggable-rectangle sandbox: a rectangle snapped onto a grid inside a
//! zoomable room.

use crate::api::{ZpdPaper, ZpdRuntime};
use crate::convert::{ROOM_OUTLINE, SANDBOX_HEIGHT, SANDBOX_WIDTH, points_attribute};
use crate::dom::SVG_NS;
use crate::runtime::Runtime;
use kurbo::{Affine, Point, Vec2};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, EventTarget, MouseEvent};
use zpd_core::{NodeId, RectDrag, SandboxConfig, ZpdOptionsPatch};

struct SandboxState {
    drag: RectDrag,
    rect: Element,
    /// Client position of the press that started the drag.
    press: Option<Point>,
    /// Inverse view matrix at press time; turns screen deltas into room units.
    view_inverse: Affine,
}

impl SandboxState {
    fn place(&self, position: Point) {
        for (name, value) in [("x", position.x), ("y", position.y)] {
            if let Err(e) = self.rect.set_attribute(name, &value.to_string()) {
                log::warn!("Could not move rectangle: {:?}", e);
            }
        }
    }
}

type Handler = Closure<dyn FnMut(MouseEvent)>;

/// A running sandbox. Dropping it removes its listeners.
#[wasm_bindgen]
pub struct Sandbox {
    paper: ZpdPaper,
    window: EventTarget,
    rect: Element,
    on_press: Handler,
    on_move: Handler,
    on_release: Handler,
}

fn svg_element(document: &Document, tag: &str, attributes: &[(&str, String)]) -> Result<Element, JsValue> {
    let element = document.create_element_ns(Some(SVG_NS), tag)?;
    for (name, value) in attributes {
        element.set_attribute(name, value)?;
    }
    Ok(element)
}

fn random_color() -> String {
    let channel = || (js_sys::Math::random() * 256.0).floor() as u8;
    format!("rgb({},{},{})", channel(), channel(), channel())
}

/// Switch pan and zoom together; off while the rectangle is dragged.
fn toggle_view(runtime: &Weak<Runtime>, canvas: NodeId, enabled: bool) {
    let Some(runtime) = runtime.upgrade() else {
        return;
    };
    let patch = ZpdOptionsPatch::new().zoom(enabled).pan(enabled);
    match runtime.with(|zpd| zpd.activate(canvas, patch)) {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => log::error!("Sandbox toggle failed: {}", e),
        Err(e) => log::warn!("Sandbox toggle skipped: {:?}", e),
    }
}

#[wasm_bindgen]
impl Sandbox {
    /// Clear `svg` and build the room, grid and rectangle.
    #[wasm_bindgen(constructor)]
    pub fn new(runtime: &ZpdRuntime, svg: &Element, config: JsValue) -> Result<Sandbox, JsValue> {
        let config: SandboxConfig = if config.is_undefined() || config.is_null() {
            SandboxConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let paper = runtime.paper(svg)?;
        let canvas = paper.canvas();
        let shared = Rc::clone(paper.runtime());

        // Start from an empty canvas.
        shared
            .with(|zpd| zpd.destroy(canvas))?
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        svg.set_inner_html("");
        svg.set_attribute("width", &SANDBOX_WIDTH.to_string())?;
        svg.set_attribute("height", &SANDBOX_HEIGHT.to_string())?;

        let document = svg
            .owner_document()
            .ok_or_else(|| JsValue::from_str("svg element has no document"))?;
        let drag = RectDrag::new(config.clone());
        let pattern_id = format!("zpd-sandbox-grid-{}", canvas.0);

        let defs = svg_element(&document, "defs", &[])?;
        let pattern = svg_element(
            &document,
            "pattern",
            &[
                ("id", pattern_id.clone()),
                ("x", "0".to_string()),
                ("y", "0".to_string()),
                ("width", config.rect_width.to_string()),
                ("height", config.rect_height.to_string()),
                ("patternUnits", "userSpaceOnUse".to_string()),
            ],
        )?;
        for line in drag.pattern_lines() {
            let element = svg_element(
                &document,
                "line",
                &[
                    ("x1", line.p0.x.to_string()),
                    ("y1", line.p0.y.to_string()),
                    ("x2", line.p1.x.to_string()),
                    ("y2", line.p1.y.to_string()),
                    ("stroke", "lightgray".to_string()),
                ],
            )?;
            pattern.append_child(&element)?;
        }
        defs.append_child(&pattern)?;
        svg.append_child(&defs)?;

        let room = svg_element(
            &document,
            "polyline",
            &[
                ("points", points_attribute(&ROOM_OUTLINE)),
                ("stroke", "#000".to_string()),
                ("stroke-width", "1".to_string()),
                ("fill", format!("url(#{})", pattern_id)),
            ],
        )?;
        svg.append_child(&room)?;

        let start = drag.position();
        let rect = svg_element(
            &document,
            "rect",
            &[
                ("x", start.x.to_string()),
                ("y", start.y.to_string()),
                ("width", config.rect_width.to_string()),
                ("height", config.rect_height.to_string()),
                ("fill", random_color()),
                ("stroke", "#000".to_string()),
                ("stroke-width", "3".to_string()),
            ],
        )?;
        svg.append_child(&rect)?;

        shared
            .with(|zpd| zpd.activate(canvas, ZpdOptionsPatch::new().zoom(true).pan(true)))?
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let state = Rc::new(RefCell::new(SandboxState {
            drag,
            rect: rect.clone(),
            press: None,
            view_inverse: Affine::IDENTITY,
        }));
        let weak_runtime = Rc::downgrade(&shared);

        let on_press = {
            let state = Rc::clone(&state);
            let runtime = weak_runtime.clone();
            Closure::wrap(Box::new(move |event: MouseEvent| {
                // Keep the canvas from starting a pan.
                event.prevent_default();
                event.stop_propagation();
                let view = runtime
                    .upgrade()
                    .and_then(|rt| rt.with(|zpd| zpd.get_ctm(canvas)).ok().flatten())
                    .unwrap_or(Affine::IDENTITY);
                let mut state = state.borrow_mut();
                state.view_inverse = view.inverse();
                state.press = Some(Point::new(f64::from(event.client_x()), f64::from(event.client_y())));
                state.drag.start();
                toggle_view(&runtime, canvas, false);
            }) as Box<dyn FnMut(MouseEvent)>)
        };

        let on_move = {
            let state = Rc::clone(&state);
            Closure::wrap(Box::new(move |event: MouseEvent| {
                let mut state = state.borrow_mut();
                let Some(press) = state.press else {
                    return;
                };
                let screen = Point::new(f64::from(event.client_x()), f64::from(event.client_y())) - press;
                let local: Vec2 = state.view_inverse * screen.to_point() - state.view_inverse * Point::ZERO;
                let position = state.drag.update(local);
                state.place(position);
            }) as Box<dyn FnMut(MouseEvent)>)
        };

        let on_release = {
            let state = Rc::clone(&state);
            let runtime = weak_runtime;
            Closure::wrap(Box::new(move |_event: MouseEvent| {
                let mut state = state.borrow_mut();
                if state.press.take().is_none() {
                    return;
                }
                let position = state.drag.end();
                state.place(position);
                log::debug!("Rectangle dropped at {:?}", position);
                drop(state);
                toggle_view(&runtime, canvas, true);
            }) as Box<dyn FnMut(MouseEvent)>)
        };

        let window: EventTarget = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .into();
        rect.add_event_listener_with_callback("mousedown", on_press.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("mouseup", on_release.as_ref().unchecked_ref())?;

        log::info!("Sandbox ready on {} with {:?}", canvas, config);
        Ok(Sandbox {
            paper,
            window,
            rect,
            on_press,
            on_move,
            on_release,
        })
    }

    /// The paper the sandbox runs on.
    #[wasm_bindgen(getter)]
    pub fn paper(&self) -> ZpdPaper {
        ZpdPaper::new(Rc::clone(self.paper.runtime()), self.paper.canvas())
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let rect: &EventTarget = self.rect.as_ref();
        let removals = [
            (rect, "mousedown", &self.on_press),
            (&self.window, "mousemove", &self.on_move),
            (&self.window, "mouseup", &self.on_release),
        ];
        for (target, kind, handler) in removals {
            if let Err(e) = target.remove_event_listener_with_callback(kind, handler.as_ref().unchecked_ref()) {
                log::warn!("Could not remove sandbox {} listener: {:?}", kind, e);
            }
        }
    }
}
