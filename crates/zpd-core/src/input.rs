//! Input events fed to the gesture router.
//!
//! Positions are in canvas space: pixels relative to the top-left corner
//! of the canvas element, before the view transform is applied.

use crate::surface::NodeId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Scroll amount carried by a wheel event, in the unit the host reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WheelDelta {
    /// Legacy `mousewheel` `wheelDelta` (120 per notch, positive = away from user).
    WheelDelta(f64),
    /// Legacy `DOMMouseScroll` `detail` (3 per notch, positive = toward user).
    Detail(f64),
    /// Modern `wheel` event with `deltaMode` pixels.
    Pixels(f64),
    /// Modern `wheel` event with `deltaMode` lines.
    Lines(f64),
}

impl WheelDelta {
    /// Zoom steps for this delta; one notch is a third of a step, positive zooms in.
    pub fn steps(self) -> f64 {
        match self {
            WheelDelta::WheelDelta(v) => v / 360.0,
            WheelDelta::Detail(v) => v / -9.0,
            WheelDelta::Pixels(v) => -v / 300.0,
            WheelDelta::Lines(v) => -v / 9.0,
        }
    }
}

/// Mouse input on a canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        /// Node under the pointer; the canvas itself when its background was hit.
        target: NodeId,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    Wheel {
        position: Point,
        delta: WheelDelta,
    },
}

/// One active touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: i32,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: i32, position: Point) -> Self {
        Self { id, position }
    }
}

/// Touch input on a canvas. Each variant carries the touches still on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TouchEvent {
    Start { touches: Vec<TouchPoint> },
    Move { touches: Vec<TouchPoint> },
    End { touches: Vec<TouchPoint> },
}

/// Midpoint and distance of the first two touches.
pub fn two_finger_geometry(touches: &[TouchPoint]) -> Option<(Point, f64)> {
    let [first, second, ..] = touches else {
        return None;
    };
    let mid = first.position.midpoint(second.position);
    let distance = (second.position - first.position).hypot();
    Some((mid, distance))
}

/// What the host should do with the native event after the router saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[must_use]
pub enum EventResponse {
    /// Let the browser apply its default scrolling/selection behaviour.
    #[default]
    PassThrough,
    /// Suppress the default behaviour.
    PreventDefault,
}

impl EventResponse {
    pub fn prevents_default(self) -> bool {
        self == EventResponse::PreventDefault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_notch_normalization() {
        // One notch away from the user in each reporting style.
        assert!((WheelDelta::WheelDelta(120.0).steps() - 1.0 / 3.0).abs() < 1e-12);
        assert!((WheelDelta::Detail(-3.0).steps() - 1.0 / 3.0).abs() < 1e-12);
        assert!((WheelDelta::Pixels(-100.0).steps() - 1.0 / 3.0).abs() < 1e-12);
        assert!((WheelDelta::Lines(-3.0).steps() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_finger_geometry() {
        let touches = [
            TouchPoint::new(0, Point::new(0.0, 0.0)),
            TouchPoint::new(1, Point::new(30.0, 40.0)),
        ];
        let (mid, distance) = two_finger_geometry(&touches).unwrap();
        assert_eq!(mid, Point::new(15.0, 20.0));
        assert!((distance - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_finger_has_no_geometry() {
        let touches = [TouchPoint::new(0, Point::new(5.0, 5.0))];
        assert!(two_finger_geometry(&touches).is_none());
    }

    #[test]
    fn test_default_response_passes_through() {
        assert!(!EventResponse::default().prevents_default());
    }
}
