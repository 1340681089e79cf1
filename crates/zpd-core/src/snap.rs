//! Grid snapping for the draggable-rectangle sandbox.

use crate::options::SandboxConfig;
use kurbo::{Line, Point, Vec2};

/// Distance within which a value is pulled onto the grid.
pub const SNAP_TOLERANCE: f64 = 25.0;

/// Snap `value` to a multiple of `grid` if it lies within `tolerance` of one.
///
/// The remainder keeps the sign of `value`, so negative values below one
/// cell snap toward zero.
pub fn snap_to(grid: f64, value: f64, tolerance: f64) -> f64 {
    if grid <= 0.0 || !grid.is_finite() {
        return value;
    }
    let rem = value % grid;
    if rem < tolerance {
        value - rem
    } else if rem > grid - tolerance {
        value - rem + grid
    } else {
        value
    }
}

/// Drag state of the sandbox rectangle.
///
/// Positions are the rectangle's `x`/`y` attributes; deltas are the
/// pointer offset since the drag started.
#[derive(Debug, Clone, PartialEq)]
pub struct RectDrag {
    config: SandboxConfig,
    offset: Vec2,
    origin: Point,
    position: Point,
    delta: Vec2,
    dragging: bool,
}

impl RectDrag {
    pub fn new(config: SandboxConfig) -> Self {
        let (offset_x, offset_y) = config.normalized_offsets();
        let offset = Vec2::new(offset_x, offset_y);
        Self {
            config,
            offset,
            origin: offset.to_point(),
            position: offset.to_point(),
            delta: Vec2::ZERO,
            dragging: false,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Current rectangle position.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// The two lines of one grid pattern cell.
    pub fn pattern_lines(&self) -> [Line; 2] {
        let (w, h) = (self.config.rect_width, self.config.rect_height);
        [
            Line::new((0.0, self.offset.y), (w, self.offset.y)),
            Line::new((self.offset.x, 0.0), (self.offset.x, h)),
        ]
    }

    /// Begin a drag from the rectangle's current position.
    pub fn start(&mut self) {
        self.origin = self.position;
        self.delta = Vec2::ZERO;
        self.dragging = true;
    }

    /// Pointer moved by `delta` since the drag started; returns the new position.
    pub fn update(&mut self, delta: Vec2) -> Point {
        if !self.dragging {
            return self.position;
        }
        let delta = Vec2::new(
            if self.config.lock_x { 0.0 } else { delta.x },
            if self.config.lock_y { 0.0 } else { delta.y },
        );
        self.delta = delta;

        self.position = if self.config.live_snap {
            let moved = self.origin + delta;
            Point::new(
                self.snap(moved.x) + self.offset.x,
                // The live formula measures y from the rectangle's bottom edge
                self.snap(moved.y) - (self.config.rect_height - self.offset.y),
            )
        } else {
            self.origin + delta
        };
        self.position
    }

    /// Finish the drag; returns the final position.
    pub fn end(&mut self) -> Point {
        if !self.dragging {
            return self.position;
        }
        self.dragging = false;
        if !self.config.live_snap {
            let moved = self.origin + self.delta;
            self.position = Point::new(self.snap(moved.x) + self.offset.x, self.snap(moved.y) + self.offset.y);
        }
        self.delta = Vec2::ZERO;
        self.position
    }

    fn snap(&self, value: f64) -> f64 {
        snap_to(self.config.grid_size, value, SNAP_TOLERANCE)
    }
}
