//! Animated transitions of a canvas matrix.
//!
//! Transitions are driven by the host's frame loop through
//! [`TransitionPlayer::tick`]. A transition starts on the first tick that
//! sees it, writes the exact target on its last tick and then calls its
//! completion callback once. Each canvas runs at most one transition:
//! starting another drops the one in flight without calling it back. A
//! transition whose final matrix cannot be written is dropped the same way.

use crate::composer::{self, commit};
use crate::controller::CanvasEntry;
use crate::error::ZpdError;
use crate::matrix::lerp;
use crate::surface::{NodeId, Surface};
use kurbo::{Affine, Point};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Callback run once after a transition's final matrix write.
pub type Completion = Box<dyn FnOnce(Affine)>;

const BACK_OVERSHOOT: f64 = 1.70158;

/// Timing curves for transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    BackIn,
    BackOut,
    Elastic,
    Bounce,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let n = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => n,
            Easing::EaseIn => n.powf(1.7),
            Easing::EaseOut => n.powf(0.48),
            Easing::EaseInOut => {
                if n == 1.0 {
                    return 1.0;
                }
                // Solve the cubic bezier (0.42, 0, 0.58, 1) for x = n.
                let q = 0.48 - n / 1.04;
                let big_q = (0.1734 + q * q).sqrt();
                let t = (big_q - q).cbrt() + (-big_q - q).cbrt() + 0.5;
                (1.0 - t) * 3.0 * t * t + t * t * t
            }
            Easing::BackIn => {
                if n == 1.0 {
                    return 1.0;
                }
                n * n * ((BACK_OVERSHOOT + 1.0) * n - BACK_OVERSHOOT)
            }
            Easing::BackOut => {
                if n == 0.0 {
                    return 0.0;
                }
                let n = n - 1.0;
                n * n * ((BACK_OVERSHOOT + 1.0) * n + BACK_OVERSHOOT) + 1.0
            }
            Easing::Elastic => {
                if n == 0.0 || n == 1.0 {
                    return n;
                }
                2f64.powf(-10.0 * n) * ((n - 0.075) * (2.0 * PI) / 0.3).sin() + 1.0
            }
            Easing::Bounce => {
                let s = 7.5625;
                let p = 2.75;
                if n < 1.0 / p {
                    s * n * n
                } else if n < 2.0 / p {
                    let n = n - 1.5 / p;
                    s * n * n + 0.75
                } else if n < 2.5 / p {
                    let n = n - 2.25 / p;
                    s * n * n + 0.9375
                } else {
                    let n = n - 2.625 / p;
                    s * n * n + 0.984375
                }
            }
        }
    }
}

impl FromStr for Easing {
    type Err = ZpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match name.as_str() {
            "linear" => Ok(Easing::Linear),
            "easein" => Ok(Easing::EaseIn),
            "easeout" => Ok(Easing::EaseOut),
            "easeinout" => Ok(Easing::EaseInOut),
            "backin" => Ok(Easing::BackIn),
            "backout" => Ok(Easing::BackOut),
            "elastic" => Ok(Easing::Elastic),
            "bounce" => Ok(Easing::Bounce),
            _ => Err(ZpdError::UnknownEasing(s.to_string())),
        }
    }
}

/// Where a transition ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionTarget {
    /// Interpolate component-wise toward a fixed matrix.
    Matrix(Affine),
    /// Rotate by `degrees` about a local pivot, interpolating the angle.
    Rotation { degrees: f64, pivot: Point },
}

impl TransitionTarget {
    fn sample(&self, from: &Affine, eased: f64) -> Affine {
        match *self {
            TransitionTarget::Matrix(to) => lerp(from, &to, eased),
            TransitionTarget::Rotation { degrees, pivot } => composer::rotate_about(from, degrees * eased, pivot),
        }
    }

    fn end(&self, from: &Affine) -> Affine {
        match *self {
            TransitionTarget::Matrix(to) => to,
            TransitionTarget::Rotation { degrees, pivot } => composer::rotate_about(from, degrees, pivot),
        }
    }
}

/// A scheduled matrix animation.
pub struct Transition {
    target: TransitionTarget,
    duration: Duration,
    easing: Easing,
    on_complete: Option<Completion>,
    from: Option<Affine>,
    started: Option<Instant>,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("has_callback", &self.on_complete.is_some())
            .field("started", &self.started)
            .finish()
    }
}

impl Transition {
    /// Create a transition; it starts on the first tick that sees it.
    pub fn new(target: TransitionTarget, duration: Duration, easing: Easing) -> Self {
        Self {
            target,
            duration,
            easing,
            on_complete: None,
            from: None,
            started: None,
        }
    }

    /// Attach a completion callback.
    pub fn on_complete(mut self, callback: Completion) -> Self {
        self.on_complete = Some(callback);
        self
    }

    fn progress(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Runs at most one transition per canvas.
#[derive(Debug, Default)]
pub struct TransitionPlayer {
    running: HashMap<NodeId, Transition>,
}

impl TransitionPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a transition, superseding any in flight on the same canvas.
    pub fn start(&mut self, canvas: NodeId, transition: Transition) {
        if let Some(previous) = self.running.insert(canvas, transition) {
            log::debug!("Transition on {} superseded: {:?}", canvas, previous);
        }
    }

    /// Drop the transition of a canvas without calling it back.
    pub fn cancel(&mut self, canvas: NodeId) -> bool {
        self.running.remove(&canvas).is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    /// Advance every transition to `now`; returns how many are still running.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &mut S,
        entries: &mut HashMap<NodeId, CanvasEntry<S::Listeners>>,
    ) -> usize {
        let mut finished = Vec::new();

        for (&canvas, transition) in self.running.iter_mut() {
            let Some(entry) = entries.get_mut(&canvas) else {
                log::debug!("Dropping transition for inactive canvas {}", canvas);
                finished.push((canvas, None));
                continue;
            };

            let from = *transition.from.get_or_insert(entry.matrix);
            if transition.started.is_none() {
                transition.started = Some(now);
            }
            let progress = transition.progress(now);
            let matrix = if progress >= 1.0 {
                transition.target.end(&from)
            } else {
                transition.target.sample(&from, transition.easing.apply(progress))
            };

            match commit(surface, entry.group, &mut entry.matrix, matrix, None) {
                Err(e) => {
                    log::error!("Transition on {} aborted: {}", canvas, e);
                    finished.push((canvas, None));
                }
                Ok(true) if progress >= 1.0 => finished.push((canvas, Some(entry.matrix))),
                // Intermediate frames may pass through a singular matrix.
                Ok(false) if progress >= 1.0 => {
                    log::warn!("Transition on {} could not reach its target", canvas);
                    finished.push((canvas, None));
                }
                Ok(_) => {}
            }
        }

        let mut callbacks = Vec::new();
        for (canvas, final_matrix) in finished {
            let Some(transition) = self.running.remove(&canvas) else {
                continue;
            };
            if let (Some(callback), Some(matrix)) = (transition.on_complete, final_matrix) {
                callbacks.push((callback, matrix));
            }
        }
        for (callback, matrix) in callbacks {
            callback(matrix);
        }

        self.running.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::Elastic,
        Easing::Bounce,
    ];

    #[test]
    fn test_easing_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-3, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 0.01);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::BackIn.apply(0.2) < 0.0);
        assert!(Easing::BackOut.apply(0.8) > 1.0);
    }

    #[test]
    fn test_parse_easing_names() {
        assert_eq!("linear".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!("easeinout".parse::<Easing>().unwrap(), Easing::EaseInOut);
        assert_eq!("ease-in".parse::<Easing>().unwrap(), Easing::EaseIn);
        assert_eq!("Bounce".parse::<Easing>().unwrap(), Easing::Bounce);
        assert!(matches!("wobble".parse::<Easing>(), Err(ZpdError::UnknownEasing(_))));
    }

    #[test]
    fn test_rotation_target_interpolates_angle() {
        let target = TransitionTarget::Rotation { degrees: 90.0, pivot: Point::ZERO };
        let halfway = target.sample(&Affine::IDENTITY, 0.5);
        let p = halfway * Point::new(1.0, 0.0);
        let expected = (45f64).to_radians();
        assert!((p.x - expected.cos()).abs() < 1e-12);
        assert!((p.y - expected.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_progress_before_start() {
        let transition = Transition::new(
            TransitionTarget::Matrix(Affine::IDENTITY),
            Duration::from_millis(100),
            Easing::Linear,
        );
        assert_eq!(transition.progress(Instant::now()), 0.0);
    }
}
