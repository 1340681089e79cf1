//! Gesture routing: turns raw pointer and touch events into pan, drag and
//! pinch-zoom updates of a canvas entry.

use crate::composer::{self, commit};
use crate::controller::CanvasEntry;
use crate::error::ZpdResult;
use crate::input::{EventResponse, PointerEvent, TouchEvent, TouchPoint, two_finger_geometry};
use crate::surface::{NodeId, Surface};
use kurbo::{Affine, Point};

/// Pinch step applied when the fingers moved apart.
pub const PINCH_ZOOM_IN: f64 = 1.02;
/// Pinch step applied when the fingers moved together.
pub const PINCH_ZOOM_OUT: f64 = 0.98;

/// What pointer-move events currently feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Panning,
    Dragging {
        target: NodeId,
    },
}

/// Two-finger tracking while a pinch is in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchState {
    /// Distance between the fingers at the last applied step.
    pub distance: f64,
    /// Finger midpoint when the pinch began (canvas space).
    pub midpoint: Point,
}

/// Mode and anchors of the gesture in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub mode: InteractionMode,
    /// Inverse of the canvas matrix when the gesture started.
    pub anchor_inverse: Affine,
    /// Pointer position at gesture start, in canvas-local space.
    pub origin: Point,
    pub pinch: Option<PinchState>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Idle,
            anchor_inverse: Affine::IDENTITY,
            origin: Point::ZERO,
            pinch: None,
        }
    }
}

impl GestureState {
    /// Capture the anchor for a gesture starting at `position`.
    fn anchor(&mut self, matrix: &Affine, position: Point) {
        self.anchor_inverse = matrix.inverse();
        self.origin = self.anchor_inverse * position;
    }

    /// Drop any gesture in progress.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Route a mouse event.
pub fn handle_pointer<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    event: &PointerEvent,
) -> ZpdResult<EventResponse> {
    match *event {
        PointerEvent::Down { position, target } => {
            entry.gesture.mode = if target == entry.canvas || !entry.options.drag {
                // Pan anyway when drag is disabled and an element was hit
                InteractionMode::Panning
            } else {
                InteractionMode::Dragging { target }
            };
            entry.gesture.anchor(&entry.matrix, position);
            Ok(EventResponse::PreventDefault)
        }
        PointerEvent::Move { position } => {
            match entry.gesture.mode {
                InteractionMode::Panning if entry.options.pan => pan_to(surface, entry, position)?,
                InteractionMode::Dragging { target } if entry.options.drag => {
                    drag_to(surface, entry, target, position)?
                }
                _ => {}
            }
            Ok(EventResponse::PreventDefault)
        }
        PointerEvent::Up { .. } => {
            entry.gesture.mode = InteractionMode::Idle;
            Ok(EventResponse::PreventDefault)
        }
        PointerEvent::Wheel { position, delta } => {
            if !entry.options.zoom {
                return Ok(EventResponse::PassThrough);
            }
            let factor = (1.0 + entry.options.zoom_scale).powf(delta.steps());
            zoom_step(surface, entry, position, factor, position)?;
            Ok(EventResponse::PreventDefault)
        }
    }
}

/// Route a touch event.
pub fn handle_touch<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    event: &TouchEvent,
) -> ZpdResult<EventResponse> {
    match event {
        TouchEvent::Start { touches } => {
            let Some(first) = touches.first() else {
                return Ok(EventResponse::PassThrough);
            };
            entry.gesture.mode = InteractionMode::Panning;
            entry.gesture.anchor(&entry.matrix, first.position);
            if let Some((midpoint, distance)) = two_finger_geometry(touches) {
                entry.gesture.pinch = Some(PinchState { distance, midpoint });
            }
            if entry.options.pan || entry.options.zoom {
                Ok(EventResponse::PreventDefault)
            } else {
                Ok(EventResponse::PassThrough)
            }
        }
        TouchEvent::Move { touches } => {
            if entry.gesture.mode != InteractionMode::Panning || !entry.options.pan {
                return Ok(EventResponse::PassThrough);
            }
            match touches.as_slice() {
                [] => {}
                [only] => pan_to(surface, entry, only.position)?,
                _ => pinch(surface, entry, touches)?,
            }
            Ok(EventResponse::PreventDefault)
        }
        TouchEvent::End { touches } => {
            entry.gesture.mode = InteractionMode::Idle;
            if touches.len() < 2 {
                entry.gesture.pinch = None;
            }
            Ok(EventResponse::PassThrough)
        }
    }
}

fn pan_to<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    position: Point,
) -> ZpdResult<()> {
    let gesture = &entry.gesture;
    let current = gesture.anchor_inverse * position;
    let proposed = composer::pan_from_anchor(&gesture.anchor_inverse, gesture.origin, current);
    commit(surface, entry.group, &mut entry.matrix, proposed, None)?;
    Ok(())
}

fn drag_to<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    target: NodeId,
    position: Point,
) -> ZpdResult<()> {
    let point = entry.matrix.inverse() * position;
    let moved = composer::drag(&surface.transform(target)?, point - entry.gesture.origin);
    surface.set_transform(target, &moved)?;
    entry.gesture.origin = point;
    Ok(())
}

/// Zoom about the screen point `anchor`; re-anchor a pan in progress at `pointer`.
fn zoom_step<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    anchor: Point,
    factor: f64,
    pointer: Point,
) -> ZpdResult<bool> {
    let proposed = composer::zoom_at_screen(&entry.matrix, anchor, factor);
    let threshold = entry.options.zoom_threshold;
    let applied = commit(surface, entry.group, &mut entry.matrix, proposed, threshold.as_ref())?;
    if applied && entry.gesture.mode == InteractionMode::Panning {
        entry.gesture.anchor(&entry.matrix, pointer);
    }
    Ok(applied)
}

fn pinch<S: Surface + ?Sized>(
    surface: &mut S,
    entry: &mut CanvasEntry<S::Listeners>,
    touches: &[TouchPoint],
) -> ZpdResult<()> {
    if !entry.options.zoom {
        return Ok(());
    }
    let Some((midpoint, distance)) = two_finger_geometry(touches) else {
        return Ok(());
    };
    let Some(state) = entry.gesture.pinch else {
        // Second finger landed without a touch-start of its own.
        entry.gesture.pinch = Some(PinchState { distance, midpoint });
        return Ok(());
    };
    if state.distance <= 0.0 {
        return Ok(());
    }

    let factor = if distance > state.distance {
        PINCH_ZOOM_IN
    } else if distance < state.distance {
        PINCH_ZOOM_OUT
    } else {
        1.0
    };
    if factor != 1.0 {
        zoom_step(surface, entry, state.midpoint, factor, touches[0].position)?;
    }
    entry.gesture.pinch = Some(PinchState { distance, ..state });
    Ok(())
}
