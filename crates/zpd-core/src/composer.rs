//! Matrix composition for pan, zoom, rotate and drag.
//!
//! All functions follow SVG matrix order: `m * step` applies `step` in
//! the local space of `m`. Every write of a canvas matrix goes through
//! [`commit`].

use crate::error::ZpdResult;
use crate::matrix::{self, is_invertible};
use crate::options::ZoomThreshold;
use crate::surface::{NodeId, Surface};
use kurbo::{Affine, Point, Vec2};

/// Pan relative to an anchor captured at gesture start.
///
/// `anchor_inverse` is the inverse matrix at gesture start, `origin` the
/// pointer position at gesture start mapped through it, and `current`
/// the pointer position now, mapped through the same inverse.
pub fn pan_from_anchor(anchor_inverse: &Affine, origin: Point, current: Point) -> Affine {
    anchor_inverse.inverse() * Affine::translate(current - origin)
}

/// Translate by a screen-space delta, independent of zoom and rotation.
pub fn pan_by(matrix: &Affine, screen_delta: Vec2) -> Affine {
    Affine::translate(screen_delta) * *matrix
}

/// The zoom step `T(p) S(z) T(-p)` about a local point.
pub fn zoom_step(anchor: Point, factor: f64) -> Affine {
    Affine::translate(anchor.to_vec2()) * Affine::scale(factor) * Affine::translate(-anchor.to_vec2())
}

/// Scale by `factor` about the local point `anchor`, which stays fixed on screen.
pub fn zoom_at(matrix: &Affine, anchor: Point, factor: f64) -> Affine {
    *matrix * zoom_step(anchor, factor)
}

/// Scale by `factor` about the screen point under the cursor.
pub fn zoom_at_screen(matrix: &Affine, screen: Point, factor: f64) -> Affine {
    zoom_at(matrix, matrix.inverse() * screen, factor)
}

/// Mirror vertically about the local point `anchor`.
pub fn flip_y_at(matrix: &Affine, anchor: Point) -> Affine {
    *matrix
        * Affine::translate(anchor.to_vec2())
        * Affine::scale_non_uniform(1.0, -1.0)
        * Affine::translate(-anchor.to_vec2())
}

/// Rotate by `degrees` about the local point `pivot`.
pub fn rotate_about(matrix: &Affine, degrees: f64, pivot: Point) -> Affine {
    *matrix * Affine::rotate_about(degrees.to_radians(), pivot)
}

/// Move a dragged element by a delta expressed in canvas-local space.
pub fn drag(target: &Affine, local_delta: Vec2) -> Affine {
    Affine::translate(local_delta) * *target
}

/// Replace the translation part of a matrix.
pub fn with_translation(matrix: &Affine, e: f64, f: f64) -> Affine {
    let [a, b, c, d, ..] = matrix.as_coeffs();
    Affine::new([a, b, c, d, e, f])
}

/// Translate so that the local point `point` lands on the screen origin.
pub fn pan_to_point(matrix: &Affine, point: Point) -> Affine {
    let screen = *matrix * point;
    pan_by(matrix, -screen.to_vec2())
}

/// Write `proposed` to the group and store it in `current`.
///
/// Returns `false` (and writes nothing) when the matrix is singular or
/// the zoom threshold refuses the step.
pub fn commit<S: Surface + ?Sized>(
    surface: &mut S,
    group: NodeId,
    current: &mut Affine,
    proposed: Affine,
    threshold: Option<&ZoomThreshold>,
) -> ZpdResult<bool> {
    if !is_invertible(&proposed) {
        log::warn!("Refusing singular matrix for {}: {}", group, matrix::dump(&proposed));
        return Ok(false);
    }
    if let Some(threshold) = threshold {
        if !threshold.admits(current, &proposed) {
            log::debug!("Zoom step outside threshold {:?} ignored", threshold);
            return Ok(false);
        }
    }
    surface.set_transform(group, &proposed)?;
    *current = proposed;
    Ok(true)
}
