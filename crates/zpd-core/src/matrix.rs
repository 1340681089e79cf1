//! Affine matrix helpers for the SVG `transform` attribute.

use crate::error::{ZpdError, ZpdResult};
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A saved view matrix, field-for-field with the SVG `matrix(a,b,c,d,e,f)` form.
///
/// Used by `save` and by the `load` option to restore a previous view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for MatrixSnapshot {
    fn default() -> Self {
        Affine::IDENTITY.into()
    }
}

impl From<Affine> for MatrixSnapshot {
    fn from(matrix: Affine) -> Self {
        let [a, b, c, d, e, f] = matrix.as_coeffs();
        Self { a, b, c, d, e, f }
    }
}

impl From<MatrixSnapshot> for Affine {
    fn from(m: MatrixSnapshot) -> Self {
        Affine::new([m.a, m.b, m.c, m.d, m.e, m.f])
    }
}

/// Format a matrix as an SVG transform attribute value.
pub fn to_svg_transform(matrix: &Affine) -> String {
    let [a, b, c, d, e, f] = matrix.as_coeffs().map(normalize_zero);
    format!("matrix({},{},{},{},{},{})", a, b, c, d, e, f)
}

/// Negative zero prints as "-0", which the attribute never needs.
fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

/// Dump a matrix in 3x3 row form (debug output).
pub fn dump(matrix: &Affine) -> String {
    let [a, b, c, d, e, f] = matrix.as_coeffs();
    format!("[ {}, {}, {}\n  {}, {}, {}\n  0, 0, 1 ]", a, c, e, b, d, f)
}

/// Parse an SVG transform list (`matrix`, `translate`, `scale`, `rotate`).
///
/// An empty string or `none` is the identity.
pub fn parse_transform(input: &str) -> ZpdResult<Affine> {
    let invalid = || ZpdError::InvalidTransform(input.to_string());

    let mut result = Affine::IDENTITY;
    let mut rest = input.trim();
    if rest.is_empty() || rest == "none" {
        return Ok(result);
    }

    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(invalid)?;
        let close = rest[open..]
            .find(')')
            .map(|i| open + i)
            .ok_or_else(invalid)?;
        let name = rest[..open].trim();
        let args = parse_numbers(&rest[open + 1..close]).ok_or_else(invalid)?;

        let step = match (name, args.as_slice()) {
            ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
            ("translate", &[x]) => Affine::translate((x, 0.0)),
            ("translate", &[x, y]) => Affine::translate((x, y)),
            ("scale", &[s]) => Affine::scale(s),
            ("scale", &[x, y]) => Affine::scale_non_uniform(x, y),
            ("rotate", &[deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", &[deg, x, y]) => Affine::rotate_about(deg.to_radians(), Point::new(x, y)),
            _ => return Err(invalid()),
        };
        result = result * step;

        rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Ok(result)
}

fn parse_numbers(args: &str) -> Option<Vec<f64>> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect()
}

/// Horizontal scale magnitude (length of the transformed x axis).
pub fn scale_x(matrix: &Affine) -> f64 {
    let [a, b, ..] = matrix.as_coeffs();
    a.hypot(b)
}

/// Vertical scale magnitude (length of the transformed y axis).
pub fn scale_y(matrix: &Affine) -> f64 {
    let [_, _, c, d, ..] = matrix.as_coeffs();
    c.hypot(d)
}

/// Whether the matrix is finite and has an inverse.
pub fn is_invertible(matrix: &Affine) -> bool {
    let det = matrix.determinant();
    matrix.as_coeffs().iter().all(|v| v.is_finite()) && det.abs() > SINGULAR_EPSILON
}

/// Component-wise interpolation between two matrices.
pub fn lerp(from: &Affine, to: &Affine, t: f64) -> Affine {
    let from = from.as_coeffs();
    let to = to.as_coeffs();
    let mut out = [0.0; 6];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = from[i] + (to[i] - from[i]) * t;
    }
    Affine::new(out)
}

/// Compare two matrices component-wise within `epsilon`.
pub fn approx_eq(lhs: &Affine, rhs: &Affine, epsilon: f64) -> bool {
    lhs.as_coeffs()
        .iter()
        .zip(rhs.as_coeffs().iter())
        .all(|(l, r)| (l - r).abs() <= epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    #[test]
    fn test_identity_attribute() {
        assert_eq!(to_svg_transform(&Affine::IDENTITY), "matrix(1,0,0,1,0,0)");
    }

    #[test]
    fn test_attribute_drops_negative_zero() {
        let m = Affine::new([-0.0, 0.0, 0.0, 2.5, -0.0, 10.0]);
        assert_eq!(to_svg_transform(&m), "matrix(0,0,0,2.5,0,10)");
    }

    #[test]
    fn test_parse_matrix() {
        let m = parse_transform("matrix(2, 0, 0, 2, 10, -5)").unwrap();
        assert_eq!(m, Affine::new([2.0, 0.0, 0.0, 2.0, 10.0, -5.0]));
    }

    #[test]
    fn test_parse_transform_list() {
        let m = parse_transform("translate(10 20) scale(2)").unwrap();
        let p = m * Point::new(1.0, 1.0);
        assert!((p.x - 12.0).abs() < 1e-10);
        assert!((p.y - 22.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_rotate_about() {
        let m = parse_transform("rotate(90, 10, 10)").unwrap();
        let p = m * Point::new(20.0, 10.0);
        assert!((p.x - 10.0).abs() < 1e-10);
        assert!((p.y - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_empty_is_identity() {
        assert_eq!(parse_transform("").unwrap(), Affine::IDENTITY);
        assert_eq!(parse_transform("none").unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_transform("skew(1"), Err(ZpdError::InvalidTransform(_))));
        assert!(matches!(parse_transform("matrix(1,2)"), Err(ZpdError::InvalidTransform(_))));
        assert!(matches!(parse_transform("scale(x)"), Err(ZpdError::InvalidTransform(_))));
    }

    #[test]
    fn test_attribute_reparses() {
        let m = Affine::translate(Vec2::new(3.5, -7.25)) * Affine::scale(1.2);
        let back = parse_transform(&to_svg_transform(&m)).unwrap();
        assert!(approx_eq(&m, &back, 1e-12));
    }

    #[test]
    fn test_scale_magnitudes_ignore_rotation() {
        let m = Affine::rotate(0.7) * Affine::scale_non_uniform(2.0, 3.0);
        assert!((scale_x(&m) - 2.0).abs() < 1e-10);
        assert!((scale_y(&m) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_matrix_detected() {
        assert!(is_invertible(&Affine::IDENTITY));
        assert!(!is_invertible(&Affine::scale(0.0)));
        assert!(!is_invertible(&Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])));
    }

    #[test]
    fn test_snapshot_conversion() {
        let m = Affine::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let snapshot = MatrixSnapshot::from(m);
        assert_eq!(snapshot.c, 3.0);
        assert_eq!(Affine::from(snapshot), m);
    }

    #[test]
    fn test_dump_layout() {
        let m = Affine::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(dump(&m), "[ 1, 3, 5\n  2, 4, 6\n  0, 0, 1 ]");
    }
}
