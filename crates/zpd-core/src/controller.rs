//! Canvas registry and the public zoom/pan/drag operations.

use crate::animation::{Completion, Easing, Instant, Transition, TransitionPlayer, TransitionTarget};
use crate::commands::{PanCoord, ZpdCommand};
use crate::composer::{self, commit};
use crate::error::{ZpdError, ZpdResult};
use crate::gesture::{self, GestureState, InteractionMode};
use crate::input::{EventResponse, PointerEvent, TouchEvent};
use crate::matrix::{self, MatrixSnapshot};
use crate::options::{ZpdOptions, ZpdOptionsPatch};
use crate::surface::{NodeId, Surface, unwrap_group, wrap_children};
use kurbo::{Affine, Point};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Prefix of the wrapping group's element id.
pub const GROUP_ID_PREFIX: &str = "zpd-";

/// Default duration of [`ZpdController::zoom_to`].
pub const ZOOM_TO_DURATION: Duration = Duration::from_millis(3000);
/// Default duration of [`ZpdController::pan_to`].
pub const PAN_TO_DURATION: Duration = Duration::from_millis(10);
/// Default duration of [`ZpdController::rotate`].
pub const ROTATE_DURATION: Duration = Duration::from_millis(10);
/// Duration of the `origin` command.
pub const ORIGIN_DURATION: Duration = Duration::from_millis(1000);

/// State kept for one active canvas.
#[derive(Debug)]
pub struct CanvasEntry<L> {
    pub canvas: NodeId,
    /// Group wrapping the canvas content; carries the transform.
    pub group: NodeId,
    /// Current transform of the group.
    pub matrix: Affine,
    pub options: ZpdOptions,
    pub gesture: GestureState,
    listeners: Option<L>,
}

/// Result of [`ZpdController::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The canvas was wrapped and starts listening.
    Initialized,
    /// The canvas was already active; options were merged.
    Reinitialized,
}

/// Result of [`ZpdController::command`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    Destroyed,
    Saved(MatrixSnapshot),
    OriginStarted,
}

/// Owns the host surface and every active canvas on it.
pub struct ZpdController<S: Surface> {
    surface: S,
    entries: HashMap<NodeId, CanvasEntry<S::Listeners>>,
    player: TransitionPlayer,
}

impl<S: Surface> ZpdController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            entries: HashMap::new(),
            player: TransitionPlayer::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn entry(&self, canvas: NodeId) -> Option<&CanvasEntry<S::Listeners>> {
        self.entries.get(&canvas)
    }

    pub fn is_active(&self, canvas: NodeId) -> bool {
        self.entries.contains_key(&canvas)
    }

    pub fn mode(&self, canvas: NodeId) -> Option<InteractionMode> {
        self.entries.get(&canvas).map(|e| e.gesture.mode)
    }

    pub fn options(&self, canvas: NodeId) -> Option<&ZpdOptions> {
        self.entries.get(&canvas).map(|e| &e.options)
    }

    /// Whether any transition is still running.
    pub fn is_animating(&self) -> bool {
        !self.player.is_idle()
    }

    /// Enable zoom/pan/drag on a canvas, or merge options into an active one.
    pub fn activate(&mut self, canvas: NodeId, patch: ZpdOptionsPatch) -> ZpdResult<Activation> {
        if let Some(entry) = self.entries.get_mut(&canvas) {
            entry.options.apply(&patch);
            log::debug!("Reinitialized {} with {:?}", canvas, entry.options);
            return Ok(Activation::Reinitialized);
        }

        let mut options = ZpdOptions::default();
        options.apply(&patch);

        let element_id = format!("{}{}", GROUP_ID_PREFIX, Uuid::new_v4());
        let group = wrap_children(&mut self.surface, canvas, &element_id)?;
        let listeners = match self.surface.attach_listeners(canvas) {
            Ok(listeners) => listeners,
            Err(e) => {
                if let Err(undo) = unwrap_group(&mut self.surface, group) {
                    log::warn!("Could not unwrap {} after failed activation: {}", group, undo);
                }
                return Err(e.into());
            }
        };

        let mut entry = CanvasEntry {
            canvas,
            group,
            matrix: Affine::IDENTITY,
            options,
            gesture: GestureState::default(),
            listeners: Some(listeners),
        };
        if let Some(load) = entry.options.load {
            commit(&mut self.surface, group, &mut entry.matrix, load.into(), None)?;
        }

        log::info!("Activated {} (group {})", canvas, element_id);
        self.entries.insert(canvas, entry);
        Ok(Activation::Initialized)
    }

    /// Run a lifecycle command, activating the canvas with defaults first if needed.
    pub fn command(&mut self, canvas: NodeId, command: ZpdCommand) -> ZpdResult<CommandOutcome> {
        if !self.is_active(canvas) {
            self.activate(canvas, ZpdOptionsPatch::new())?;
        }
        match command {
            ZpdCommand::Destroy => {
                self.destroy(canvas)?;
                Ok(CommandOutcome::Destroyed)
            }
            ZpdCommand::Save => {
                let matrix = self.save(canvas).unwrap_or_default();
                Ok(CommandOutcome::Saved(matrix))
            }
            ZpdCommand::Origin => {
                self.origin(canvas, None)?;
                Ok(CommandOutcome::OriginStarted)
            }
        }
    }

    /// Detach listeners and put the canvas content back where it was.
    ///
    /// Returns `false` when the canvas was not active.
    pub fn destroy(&mut self, canvas: NodeId) -> ZpdResult<bool> {
        let Some(mut entry) = self.entries.remove(&canvas) else {
            log::debug!("destroy: {} is not active", canvas);
            return Ok(false);
        };
        if self.player.cancel(canvas) {
            log::debug!("Dropped running transition of {}", canvas);
        }
        if let Some(listeners) = entry.listeners.take() {
            self.surface.detach_listeners(canvas, listeners);
        }
        unwrap_group(&mut self.surface, entry.group)?;
        self.surface.release(canvas);
        log::info!("Destroyed {}", canvas);
        Ok(true)
    }

    /// The current matrix, for restoring later through the `load` option.
    pub fn save(&self, canvas: NodeId) -> Option<MatrixSnapshot> {
        self.entries.get(&canvas).map(|e| MatrixSnapshot::from(e.matrix))
    }

    /// Animate back to zoom 1 with no translation.
    pub fn origin(&mut self, canvas: NodeId, on_complete: Option<Completion>) -> ZpdResult<()> {
        self.zoom_to(canvas, 1.0, Some(ORIGIN_DURATION), None, on_complete)
    }

    /// Route a mouse event to its canvas.
    pub fn handle_pointer(&mut self, canvas: NodeId, event: &PointerEvent) -> ZpdResult<EventResponse> {
        let Some(entry) = self.entries.get_mut(&canvas) else {
            return Ok(EventResponse::PassThrough);
        };
        gesture::handle_pointer(&mut self.surface, entry, event)
    }

    /// Route a touch event to its canvas.
    pub fn handle_touch(&mut self, canvas: NodeId, event: &TouchEvent) -> ZpdResult<EventResponse> {
        let Some(entry) = self.entries.get_mut(&canvas) else {
            return Ok(EventResponse::PassThrough);
        };
        gesture::handle_touch(&mut self.surface, entry, event)
    }

    /// Animate to a pure scale of `zoom`, dropping any translation.
    pub fn zoom_to(
        &mut self,
        canvas: NodeId,
        zoom: f64,
        duration: Option<Duration>,
        easing: Option<Easing>,
        on_complete: Option<Completion>,
    ) -> ZpdResult<()> {
        check_zoom(zoom)?;
        if !self.is_active(canvas) {
            log::debug!("zoom_to: {} is not active", canvas);
            return Ok(());
        }
        let transition = Transition::new(
            TransitionTarget::Matrix(Affine::scale(zoom)),
            duration.unwrap_or(ZOOM_TO_DURATION),
            easing.unwrap_or_default(),
        );
        self.schedule(canvas, transition, on_complete);
        Ok(())
    }

    /// Scale by `zoom` about the centre of the content, immediately.
    pub fn zoom_to_no_pan(&mut self, canvas: NodeId, zoom: f64) -> ZpdResult<()> {
        check_zoom(zoom)?;
        let Some(entry) = self.entries.get_mut(&canvas) else {
            log::debug!("zoom_to_no_pan: {} is not active", canvas);
            return Ok(());
        };
        if !entry.options.zoom {
            return Ok(());
        }
        let anchor = content_center(&self.surface, entry)?;
        let proposed = composer::zoom_at(&entry.matrix, anchor, zoom);
        commit(&mut self.surface, entry.group, &mut entry.matrix, proposed, None)?;
        Ok(())
    }

    /// Animate the translation; a missing coordinate keeps its current value.
    pub fn pan_to(
        &mut self,
        canvas: NodeId,
        x: Option<PanCoord>,
        y: Option<PanCoord>,
        duration: Option<Duration>,
        easing: Option<Easing>,
        on_complete: Option<Completion>,
    ) -> ZpdResult<()> {
        let Some(entry) = self.entries.get(&canvas) else {
            log::debug!("pan_to: {} is not active", canvas);
            return Ok(());
        };
        let current = entry.matrix.translation();
        let (e, f) = (
            PanCoord::resolve_or_keep(x, current.x),
            PanCoord::resolve_or_keep(y, current.y),
        );
        if !e.is_finite() || !f.is_finite() {
            log::error!("pan_to: coordinates must be finite, got ({}, {})", e, f);
            return Err(ZpdError::InvalidPanCoord(format!("({}, {})", e, f)));
        }
        let target = composer::with_translation(&entry.matrix, e, f);
        let transition = Transition::new(
            TransitionTarget::Matrix(target),
            duration.unwrap_or(PAN_TO_DURATION),
            easing.unwrap_or_default(),
        );
        self.schedule(canvas, transition, on_complete);
        Ok(())
    }

    /// Move the local point `point` to the screen origin, immediately.
    pub fn pan_to_point(&mut self, canvas: NodeId, point: Point) -> ZpdResult<()> {
        let Some(entry) = self.entries.get_mut(&canvas) else {
            log::debug!("pan_to_point: {} is not active", canvas);
            return Ok(());
        };
        let proposed = composer::pan_to_point(&entry.matrix, point);
        commit(&mut self.surface, entry.group, &mut entry.matrix, proposed, None)?;
        Ok(())
    }

    /// Animate a rotation by `degrees` about a local pivot.
    ///
    /// A missing, zero or non-finite pivot coordinate falls back to the
    /// middle of the canvas on that axis.
    pub fn rotate(
        &mut self,
        canvas: NodeId,
        degrees: f64,
        pivot: Option<Point>,
        duration: Option<Duration>,
        easing: Option<Easing>,
        on_complete: Option<Completion>,
    ) -> ZpdResult<()> {
        if !degrees.is_finite() || degrees <= 0.0 {
            log::error!("rotate: angle must be a positive number, got {}", degrees);
            return Err(ZpdError::InvalidAngle(degrees));
        }
        if !self.is_active(canvas) {
            log::debug!("rotate: {} is not active", canvas);
            return Ok(());
        }
        let size = self.surface.viewport_size(canvas)?;
        let pivot = pivot.unwrap_or(Point::ZERO);
        let axis = |value: f64, extent: f64| {
            if !value.is_finite() || value == 0.0 { extent / 2.0 } else { value }
        };
        let pivot = Point::new(axis(pivot.x, size.width), axis(pivot.y, size.height));
        let transition = Transition::new(
            TransitionTarget::Rotation { degrees, pivot },
            duration.unwrap_or(ROTATE_DURATION),
            easing.unwrap_or_default(),
        );
        self.schedule(canvas, transition, on_complete);
        Ok(())
    }

    /// Horizontal scale of the current matrix.
    pub fn get_current_zoom(&self, canvas: NodeId) -> Option<f64> {
        self.entries.get(&canvas).map(|e| e.matrix.as_coeffs()[0])
    }

    pub fn get_ctm(&self, canvas: NodeId) -> Option<Affine> {
        self.entries.get(&canvas).map(|e| e.matrix)
    }

    /// Replace the matrix; `None` resets to identity.
    pub fn set_ctm(&mut self, canvas: NodeId, matrix: Option<Affine>) -> ZpdResult<()> {
        let Some(entry) = self.entries.get_mut(&canvas) else {
            log::debug!("set_ctm: {} is not active", canvas);
            return Ok(());
        };
        let proposed = matrix.unwrap_or(Affine::IDENTITY);
        if !matrix::is_invertible(&proposed) {
            log::error!("set_ctm: {}", matrix::dump(&proposed));
            return Err(ZpdError::SingularMatrix(matrix::to_svg_transform(&proposed)));
        }
        commit(&mut self.surface, entry.group, &mut entry.matrix, proposed, None)?;
        Ok(())
    }

    /// Mirror the content vertically about its centre.
    pub fn flip_y(&mut self, canvas: NodeId) -> ZpdResult<()> {
        let Some(entry) = self.entries.get_mut(&canvas) else {
            log::debug!("flip_y: {} is not active", canvas);
            return Ok(());
        };
        let anchor = content_center(&self.surface, entry)?;
        let proposed = composer::flip_y_at(&entry.matrix, anchor);
        commit(&mut self.surface, entry.group, &mut entry.matrix, proposed, None)?;
        Ok(())
    }

    /// The group wrapping the canvas content.
    pub fn get_underlying_group(&self, canvas: NodeId) -> Option<NodeId> {
        self.entries.get(&canvas).map(|e| e.group)
    }

    /// Advance running transitions; returns how many are still running.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.player.tick(now, &mut self.surface, &mut self.entries)
    }

    fn schedule(&mut self, canvas: NodeId, transition: Transition, on_complete: Option<Completion>) {
        let transition = match on_complete {
            Some(callback) => transition.on_complete(callback),
            None => transition,
        };
        self.player.start(canvas, transition);
    }
}

fn check_zoom(zoom: f64) -> ZpdResult<()> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        log::error!("zoom factor must be a positive number, got {}", zoom);
        Err(ZpdError::InvalidZoom(zoom))
    }
}

/// Centre of the group's content in local space, or of the viewport when empty.
fn content_center<S: Surface>(surface: &S, entry: &CanvasEntry<S::Listeners>) -> ZpdResult<Point> {
    match surface.bounding_box(entry.group)? {
        Some(bounds) => Ok(bounds.center()),
        None => {
            let size = surface.viewport_size(entry.canvas)?;
            Ok(entry.matrix.inverse() * Point::new(size.width / 2.0, size.height / 2.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;
    use kurbo::{Rect, Size, Vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn canvas_with_children() -> (ZpdController<MemorySurface>, NodeId, Vec<NodeId>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut surface = MemorySurface::new();
        let canvas = surface.add_canvas(Size::new(800.0, 600.0));
        let children = vec![
            surface.add_element(canvas, "rect", Rect::new(0.0, 0.0, 100.0, 50.0)).unwrap(),
            surface.add_element(canvas, "circle", Rect::new(200.0, 100.0, 300.0, 200.0)).unwrap(),
            surface.add_element(canvas, "path", Rect::new(50.0, 250.0, 150.0, 350.0)).unwrap(),
        ];
        (ZpdController::new(surface), canvas, children)
    }

    fn active() -> (ZpdController<MemorySurface>, NodeId) {
        let (mut zpd, canvas, _) = canvas_with_children();
        zpd.activate(canvas, ZpdOptionsPatch::new()).unwrap();
        (zpd, canvas)
    }

    /// Tick once to start, then once past the end.
    fn finish(zpd: &mut ZpdController<MemorySurface>, duration: Duration) {
        let start = Instant::now();
        zpd.tick(start);
        zpd.tick(start + duration + Duration::from_millis(1));
    }

    #[test]
    fn test_activate_wraps_children() {
        let (mut zpd, canvas, children) = canvas_with_children();

        assert_eq!(zpd.activate(canvas, ZpdOptionsPatch::new()).unwrap(), Activation::Initialized);

        let group = zpd.get_underlying_group(canvas).unwrap();
        let surface = zpd.surface();
        assert_eq!(surface.children(canvas).unwrap(), vec![group]);
        assert_eq!(surface.children(group).unwrap(), children);
        assert!(surface.element_id(group).unwrap().starts_with(GROUP_ID_PREFIX));
        assert!(surface.is_listening(canvas));
    }

    #[test]
    fn test_reinit_merges_without_rewrapping() {
        let (mut zpd, canvas) = active();
        let group = zpd.get_underlying_group(canvas).unwrap();

        let outcome = zpd.activate(canvas, ZpdOptionsPatch::new().drag(true).pan(false)).unwrap();

        assert_eq!(outcome, Activation::Reinitialized);
        assert_eq!(zpd.get_underlying_group(canvas), Some(group));
        assert_eq!(zpd.surface().children(canvas).unwrap(), vec![group]);
        let options = zpd.options(canvas).unwrap();
        assert!(options.drag);
        assert!(!options.pan);
        assert!(options.zoom);
    }

    #[test]
    fn test_destroy_restores_children() {
        let (mut zpd, canvas, children) = canvas_with_children();
        zpd.activate(canvas, ZpdOptionsPatch::new()).unwrap();
        let group = zpd.get_underlying_group(canvas).unwrap();

        assert_eq!(zpd.command(canvas, ZpdCommand::Destroy).unwrap(), CommandOutcome::Destroyed);

        let surface = zpd.surface();
        assert_eq!(surface.children(canvas).unwrap(), children);
        assert!(!surface.contains(group));
        assert!(!surface.is_listening(canvas));
        assert!(!zpd.is_active(canvas));
    }

    #[test]
    fn test_operations_after_destroy_are_noops() {
        let (mut zpd, canvas) = active();
        zpd.destroy(canvas).unwrap();

        assert!(!zpd.destroy(canvas).unwrap());
        zpd.zoom_to(canvas, 2.0, None, None, None).unwrap();
        zpd.pan_to(canvas, Some(PanCoord::Absolute(5.0)), None, None, None, None).unwrap();
        zpd.set_ctm(canvas, Some(Affine::scale(2.0))).unwrap();
        zpd.flip_y(canvas).unwrap();
        assert!(!zpd.is_animating());
        assert_eq!(zpd.get_ctm(canvas), None);
        assert_eq!(zpd.get_current_zoom(canvas), None);
        assert_eq!(zpd.save(canvas), None);
    }

    #[test]
    fn test_command_initializes_unknown_canvas() {
        let (mut zpd, canvas, _) = canvas_with_children();

        let outcome = zpd.command(canvas, ZpdCommand::Save).unwrap();

        assert_eq!(outcome, CommandOutcome::Saved(MatrixSnapshot::default()));
        assert!(zpd.is_active(canvas));
    }

    #[test]
    fn test_load_restores_saved_matrix() {
        let (mut zpd, canvas, _) = canvas_with_children();
        let saved = MatrixSnapshot { a: 2.0, b: 0.0, c: 0.0, d: 2.0, e: 30.0, f: -15.0 };

        zpd.activate(canvas, ZpdOptionsPatch::new().load(saved)).unwrap();

        assert_eq!(zpd.save(canvas), Some(saved));
        let group = zpd.get_underlying_group(canvas).unwrap();
        assert_eq!(zpd.surface().transform_attribute(group), Some("matrix(2,0,0,2,30,-15)"));
    }

    #[test]
    fn test_zoom_to_is_idempotent() {
        let (mut zpd, canvas) = active();
        zpd.pan_to(canvas, Some(PanCoord::Absolute(40.0)), Some(PanCoord::Absolute(20.0)), None, None, None)
            .unwrap();
        finish(&mut zpd, PAN_TO_DURATION);

        zpd.zoom_to(canvas, 1.0, None, None, None).unwrap();
        finish(&mut zpd, ZOOM_TO_DURATION);
        let first = zpd.get_ctm(canvas).unwrap();
        zpd.zoom_to(canvas, 1.0, None, None, None).unwrap();
        finish(&mut zpd, ZOOM_TO_DURATION);

        assert_eq!(first, Affine::IDENTITY);
        assert_eq!(zpd.get_ctm(canvas), Some(first));
    }

    #[test]
    fn test_relative_pan_round_trip() {
        let (mut zpd, canvas) = active();
        zpd.set_ctm(canvas, Some(Affine::translate((12.0, 7.0)) * Affine::scale(1.5))).unwrap();
        let before = zpd.get_ctm(canvas).unwrap();

        zpd.pan_to(canvas, Some("+10".parse().unwrap()), Some(PanCoord::Relative(0.0)), None, None, None)
            .unwrap();
        finish(&mut zpd, PAN_TO_DURATION);
        assert!((zpd.get_ctm(canvas).unwrap().translation() - Vec2::new(22.0, 7.0)).hypot() < 1e-9);

        zpd.pan_to(canvas, Some("-10".parse().unwrap()), Some(PanCoord::Relative(0.0)), None, None, None)
            .unwrap();
        finish(&mut zpd, PAN_TO_DURATION);
        assert!(matrix::approx_eq(&zpd.get_ctm(canvas).unwrap(), &before, 1e-9));
    }

    #[test]
    fn test_pan_to_keeps_missing_coordinate() {
        let (mut zpd, canvas) = active();
        zpd.set_ctm(canvas, Some(Affine::translate((3.0, 9.0)))).unwrap();

        zpd.pan_to(canvas, Some(PanCoord::Absolute(50.0)), None, None, None, None).unwrap();
        finish(&mut zpd, PAN_TO_DURATION);

        assert_eq!(zpd.get_ctm(canvas).unwrap().translation(), Vec2::new(50.0, 9.0));
    }

    #[test]
    fn test_invalid_zoom_is_rejected() {
        let (mut zpd, canvas) = active();

        for zoom in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(zpd.zoom_to(canvas, zoom, None, None, None), Err(ZpdError::InvalidZoom(_))));
            assert!(matches!(zpd.zoom_to_no_pan(canvas, zoom), Err(ZpdError::InvalidZoom(_))));
        }
        assert!(matches!(
            zpd.rotate(canvas, -15.0, None, None, None, None),
            Err(ZpdError::InvalidAngle(_))
        ));
        assert!(!zpd.is_animating());
        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_transition_interpolates_then_lands_exactly() {
        let (mut zpd, canvas) = active();
        zpd.zoom_to(canvas, 3.0, Some(Duration::from_millis(100)), None, None).unwrap();
        let start = Instant::now();

        assert_eq!(zpd.tick(start), 1);
        assert_eq!(zpd.get_current_zoom(canvas), Some(1.0));

        zpd.tick(start + Duration::from_millis(50));
        let halfway = zpd.get_current_zoom(canvas).unwrap();
        assert!((halfway - 2.0).abs() < 1e-9);

        assert_eq!(zpd.tick(start + Duration::from_millis(100)), 0);
        assert_eq!(zpd.get_ctm(canvas), Some(Affine::scale(3.0)));
        assert!(!zpd.is_animating());
    }

    #[test]
    fn test_completion_called_once() {
        let (mut zpd, canvas) = active();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);

        zpd.zoom_to(
            canvas,
            2.0,
            Some(Duration::from_millis(20)),
            Some(Easing::EaseInOut),
            Some(Box::new(move |m| sink.borrow_mut().push(m))),
        )
        .unwrap();
        let start = Instant::now();
        zpd.tick(start);
        zpd.tick(start + Duration::from_millis(30));
        zpd.tick(start + Duration::from_millis(60));

        assert_eq!(*calls.borrow(), vec![Affine::scale(2.0)]);
    }

    #[test]
    fn test_new_transition_supersedes_running_one() {
        let (mut zpd, canvas) = active();
        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);

        zpd.zoom_to(canvas, 4.0, None, None, Some(Box::new(move |_| *flag.borrow_mut() = true)))
            .unwrap();
        zpd.tick(Instant::now());
        zpd.zoom_to(canvas, 0.5, Some(Duration::from_millis(10)), None, None).unwrap();
        finish(&mut zpd, Duration::from_millis(10));

        assert!(!*called.borrow());
        assert_eq!(zpd.get_ctm(canvas), Some(Affine::scale(0.5)));
    }

    #[test]
    fn test_destroy_drops_transition() {
        let (mut zpd, canvas) = active();
        zpd.zoom_to(canvas, 2.0, None, None, None).unwrap();
        zpd.destroy(canvas).unwrap();

        assert!(!zpd.is_animating());
        assert_eq!(zpd.tick(Instant::now()), 0);
    }

    #[test]
    fn test_origin_command_resets_zoom() {
        let (mut zpd, canvas) = active();
        zpd.set_ctm(canvas, Some(Affine::translate((100.0, 50.0)) * Affine::scale(3.0))).unwrap();

        assert_eq!(zpd.command(canvas, ZpdCommand::Origin).unwrap(), CommandOutcome::OriginStarted);
        finish(&mut zpd, ORIGIN_DURATION);

        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_rotate_defaults_pivot_to_canvas_center() {
        let (mut zpd, canvas) = active();

        zpd.rotate(canvas, 90.0, None, None, None, None).unwrap();
        finish(&mut zpd, ROTATE_DURATION);

        let ctm = zpd.get_ctm(canvas).unwrap();
        let center = Point::new(400.0, 300.0);
        assert!((ctm * center - center).hypot() < 1e-9);
        assert!((ctm * Point::new(500.0, 300.0) - Point::new(400.0, 400.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_rotate_uses_explicit_pivot() {
        let (mut zpd, canvas) = active();
        let pivot = Point::new(10.0, 20.0);

        zpd.rotate(canvas, 45.0, Some(pivot), None, None, None).unwrap();
        finish(&mut zpd, ROTATE_DURATION);

        let ctm = zpd.get_ctm(canvas).unwrap();
        assert!((ctm * pivot - pivot).hypot() < 1e-9);
    }

    #[test]
    fn test_rotate_non_finite_pivot_uses_canvas_center() {
        let (mut zpd, canvas) = active();

        zpd.rotate(canvas, 90.0, Some(Point::new(f64::NAN, f64::INFINITY)), None, None, None)
            .unwrap();
        finish(&mut zpd, ROTATE_DURATION);

        let ctm = zpd.get_ctm(canvas).unwrap();
        assert!((ctm * Point::new(500.0, 300.0) - Point::new(400.0, 400.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_pan_to_rejects_non_finite_coordinate() {
        let (mut zpd, canvas) = active();

        let result = zpd.pan_to(canvas, Some(PanCoord::Absolute(f64::NAN)), None, None, None, None);

        assert!(matches!(result, Err(ZpdError::InvalidPanCoord(_))));
        assert!(!zpd.is_animating());
        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_unreachable_target_skips_completion() {
        let (mut zpd, canvas) = active();
        let called = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&called);
        let duration = Duration::from_millis(10);

        let transition = Transition::new(TransitionTarget::Matrix(Affine::scale(0.0)), duration, Easing::Linear);
        zpd.schedule(canvas, transition, Some(Box::new(move |_| *flag.borrow_mut() = true)));
        finish(&mut zpd, duration);

        assert!(!*called.borrow());
        assert!(!zpd.is_animating());
        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_set_ctm_none_resets() {
        let (mut zpd, canvas) = active();
        zpd.set_ctm(canvas, Some(Affine::scale(2.0))).unwrap();

        zpd.set_ctm(canvas, None).unwrap();

        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
        assert!(matches!(
            zpd.set_ctm(canvas, Some(Affine::scale(0.0))),
            Err(ZpdError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_zoom_to_no_pan_keeps_content_center() {
        let (mut zpd, canvas) = active();
        // Content spans (0,0)-(300,350).
        let center = Point::new(150.0, 175.0);

        zpd.zoom_to_no_pan(canvas, 2.0).unwrap();

        let ctm = zpd.get_ctm(canvas).unwrap();
        assert!((ctm * center - center).hypot() < 1e-9);
        assert_eq!(ctm.as_coeffs()[0], 2.0);
    }

    #[test]
    fn test_zoom_to_no_pan_respects_zoom_option() {
        let (mut zpd, canvas) = active();
        zpd.activate(canvas, ZpdOptionsPatch::new().zoom(false)).unwrap();

        zpd.zoom_to_no_pan(canvas, 2.0).unwrap();

        assert_eq!(zpd.get_ctm(canvas), Some(Affine::IDENTITY));
    }

    #[test]
    fn test_flip_y_twice_is_identity() {
        let (mut zpd, canvas) = active();

        zpd.flip_y(canvas).unwrap();
        let flipped = zpd.get_ctm(canvas).unwrap();
        assert_eq!(flipped.as_coeffs()[3], -1.0);
        let center = Point::new(150.0, 175.0);
        assert!((flipped * center - center).hypot() < 1e-9);

        zpd.flip_y(canvas).unwrap();
        assert!(matrix::approx_eq(&zpd.get_ctm(canvas).unwrap(), &Affine::IDENTITY, 1e-9));
    }

    #[test]
    fn test_pan_to_point() {
        let (mut zpd, canvas) = active();
        zpd.set_ctm(canvas, Some(Affine::scale(2.0))).unwrap();

        zpd.pan_to_point(canvas, Point::new(20.0, 10.0)).unwrap();

        let ctm = zpd.get_ctm(canvas).unwrap();
        assert!((ctm * Point::new(20.0, 10.0)).to_vec2().hypot() < 1e-9);
    }

    #[test]
    fn test_handlers_ignore_inactive_canvas() {
        let (mut zpd, canvas, _) = canvas_with_children();

        let response = zpd
            .handle_pointer(canvas, &PointerEvent::Down { position: Point::ZERO, target: canvas })
            .unwrap();

        assert!(!response.prevents_default());
        assert_eq!(zpd.mode(canvas), None);
    }
}
