//! Conversions from raw browser values to controller inputs.

use kurbo::Point;
use std::time::Duration;
use zpd_core::{Easing, WheelDelta};

/// `WheelEvent.DOM_DELTA_LINE`.
pub const DOM_DELTA_LINE: u32 = 1;
/// `WheelEvent.DOM_DELTA_PAGE`.
pub const DOM_DELTA_PAGE: u32 = 2;

/// Lines scrolled by one page-mode wheel unit.
const LINES_PER_PAGE: f64 = 30.0;

/// Outline of the sandbox room, as a `points` attribute.
pub const ROOM_OUTLINE: [(f64, f64); 5] = [(0.0, 0.0), (0.0, 480.0), (1064.0, 480.0), (1064.0, 0.0), (0.0, 0.0)];

/// Sandbox canvas size.
pub const SANDBOX_WIDTH: f64 = 1700.0;
pub const SANDBOX_HEIGHT: f64 = 960.0;

/// Scroll amount of a `wheel` event.
pub fn wheel_delta(delta_mode: u32, delta_y: f64) -> WheelDelta {
    match delta_mode {
        DOM_DELTA_LINE => WheelDelta::Lines(delta_y),
        DOM_DELTA_PAGE => WheelDelta::Lines(delta_y * LINES_PER_PAGE),
        _ => WheelDelta::Pixels(delta_y),
    }
}

/// Client coordinates relative to an element's top-left corner.
pub fn local_position(client_x: f64, client_y: f64, left: f64, top: f64) -> Point {
    Point::new(client_x - left, client_y - top)
}

/// Interval argument in milliseconds; anything but a representable
/// non-negative number means "default".
pub fn duration_ms(ms: Option<f64>) -> Option<Duration> {
    let ms = ms?;
    match Duration::try_from_secs_f64(ms / 1000.0) {
        Ok(duration) => Some(duration),
        Err(e) => {
            log::warn!("Interval {} ms ignored: {}", ms, e);
            None
        }
    }
}

/// Easing argument; unknown names fall back to the default curve.
pub fn easing(name: Option<&str>) -> Option<Easing> {
    match name?.parse() {
        Ok(easing) => Some(easing),
        Err(e) => {
            log::warn!("{}, using linear", e);
            None
        }
    }
}

/// `points` attribute for a polyline.
pub fn points_attribute(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}
