//! Translation of DOM events into controller input.

use crate::convert::{local_position, wheel_delta};
use crate::dom::DomSurface;
use kurbo::Point;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent, TouchList, WheelEvent};
use zpd_core::{NodeId, PointerEvent, TouchEvent, TouchPoint};

pub(crate) enum Input {
    Pointer(PointerEvent),
    Touch(TouchEvent),
}

/// Convert `event`, received on `canvas`, into controller input.
pub(crate) fn translate(surface: &DomSurface, canvas: NodeId, event: &Event) -> Option<Input> {
    let canvas_element = surface.element(canvas).ok()?;
    let origin = canvas_element.get_bounding_client_rect();
    let at = |x: i32, y: i32| local_position(f64::from(x), f64::from(y), origin.left(), origin.top());

    let kind = event.type_();
    match kind.as_str() {
        "mousedown" | "mousemove" | "mouseup" | "mouseleave" => {
            let mouse = event.dyn_ref::<MouseEvent>()?;
            let position = at(mouse.client_x(), mouse.client_y());
            let pointer = match kind.as_str() {
                "mousedown" => PointerEvent::Down {
                    position,
                    target: hit_target(surface, canvas, &canvas_element, event),
                },
                "mousemove" => PointerEvent::Move { position },
                _ => PointerEvent::Up { position },
            };
            Some(Input::Pointer(pointer))
        }
        "wheel" => {
            let wheel = event.dyn_ref::<WheelEvent>()?;
            Some(Input::Pointer(PointerEvent::Wheel {
                position: at(wheel.client_x(), wheel.client_y()),
                delta: wheel_delta(wheel.delta_mode(), wheel.delta_y()),
            }))
        }
        "touchstart" | "touchmove" | "touchend" => {
            let touch = event.dyn_ref::<web_sys::TouchEvent>()?;
            let touches = touch_points(&touch.target_touches(), origin.left(), origin.top());
            let touch = match kind.as_str() {
                "touchstart" => TouchEvent::Start { touches },
                "touchmove" => TouchEvent::Move { touches },
                _ => TouchEvent::End { touches },
            };
            Some(Input::Touch(touch))
        }
        _ => None,
    }
}

fn hit_target(surface: &DomSurface, canvas: NodeId, canvas_element: &Element, event: &Event) -> NodeId {
    match event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
        Some(element) if &element != canvas_element => surface.register(&element),
        _ => canvas,
    }
}

fn touch_points(list: &TouchList, left: f64, top: f64) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|touch| {
            let position: Point =
                local_position(f64::from(touch.client_x()), f64::from(touch.client_y()), left, top);
            TouchPoint::new(touch.identifier(), position)
        })
        .collect()
}
