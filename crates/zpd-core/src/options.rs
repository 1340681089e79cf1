//! Controller and sandbox configuration.

use crate::error::ZpdResult;
use crate::matrix::{MatrixSnapshot, scale_x, scale_y};
use kurbo::Affine;
use serde::{Deserialize, Deserializer, Serialize};

/// Default wheel zoom sensitivity.
pub const DEFAULT_ZOOM_SCALE: f64 = 0.2;

/// Allowed scale range for interactive zoom steps, written `[min, max]`.
///
/// Both axes are checked: a step is refused when either axis scale would
/// leave the open interval `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ZoomThreshold {
    pub min: f64,
    pub max: f64,
}

impl From<[f64; 2]> for ZoomThreshold {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ZoomThreshold> for [f64; 2] {
    fn from(t: ZoomThreshold) -> Self {
        [t.min, t.max]
    }
}

impl ZoomThreshold {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether both axis scales of `matrix` lie strictly inside the range.
    pub fn contains(&self, matrix: &Affine) -> bool {
        [scale_x(matrix), scale_y(matrix)]
            .iter()
            .all(|&s| s > self.min && s < self.max)
    }

    /// Whether a step from `current` to `proposed` may be committed.
    ///
    /// Steps ending inside the range are always fine. A matrix that is
    /// already outside (loaded or set directly) may still move back
    /// toward the range, never further away.
    pub fn admits(&self, current: &Affine, proposed: &Affine) -> bool {
        self.contains(proposed) || self.excess(proposed) < self.excess(current)
    }

    fn excess(&self, matrix: &Affine) -> f64 {
        [scale_x(matrix), scale_y(matrix)]
            .iter()
            .map(|&s| (self.min - s).max(0.0) + (s - self.max).max(0.0))
            .sum()
    }
}

/// Per-canvas controller options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZpdOptions {
    /// Enable panning with mouse and single-finger touch.
    pub pan: bool,
    /// Enable wheel and pinch zoom.
    pub zoom: bool,
    /// Enable dragging individual elements.
    pub drag: bool,
    /// Wheel zoom sensitivity: one step scales by `1 + zoom_scale`.
    pub zoom_scale: f64,
    /// Optional scale range for interactive zoom.
    pub zoom_threshold: Option<ZoomThreshold>,
    /// Matrix to restore when the canvas is first activated.
    pub load: Option<MatrixSnapshot>,
}

impl Default for ZpdOptions {
    fn default() -> Self {
        Self {
            pan: true,
            zoom: true,
            drag: false,
            zoom_scale: DEFAULT_ZOOM_SCALE,
            zoom_threshold: None,
            load: None,
        }
    }
}

impl ZpdOptions {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> ZpdResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overwrite every field the patch sets.
    pub fn apply(&mut self, patch: &ZpdOptionsPatch) {
        if let Some(pan) = patch.pan {
            self.pan = pan;
        }
        if let Some(zoom) = patch.zoom {
            self.zoom = zoom;
        }
        if let Some(drag) = patch.drag {
            self.drag = drag;
        }
        if let Some(zoom_scale) = patch.zoom_scale {
            self.zoom_scale = zoom_scale;
        }
        if let Some(threshold) = patch.zoom_threshold {
            self.zoom_threshold = threshold;
        }
        if let Some(load) = patch.load {
            self.load = Some(load);
        }
    }
}

/// A partial set of options, merged into existing options on re-activation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZpdOptionsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_scale: Option<f64>,
    /// `Some(None)` clears the threshold (`"zoomThreshold": null`).
    #[serde(
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub zoom_threshold: Option<Option<ZoomThreshold>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<MatrixSnapshot>,
}

/// Distinguish an explicit `null` from a missing field.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ZpdOptionsPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a patch from JSON.
    pub fn from_json(json: &str) -> ZpdResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn pan(mut self, enabled: bool) -> Self {
        self.pan = Some(enabled);
        self
    }

    pub fn zoom(mut self, enabled: bool) -> Self {
        self.zoom = Some(enabled);
        self
    }

    pub fn drag(mut self, enabled: bool) -> Self {
        self.drag = Some(enabled);
        self
    }

    pub fn zoom_scale(mut self, scale: f64) -> Self {
        self.zoom_scale = Some(scale);
        self
    }

    pub fn zoom_threshold(mut self, threshold: Option<ZoomThreshold>) -> Self {
        self.zoom_threshold = Some(threshold);
        self
    }

    pub fn load(mut self, matrix: impl Into<MatrixSnapshot>) -> Self {
        self.load = Some(matrix.into());
        self
    }
}

/// Settings for the draggable-rectangle sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    /// Grid pitch the rectangle snaps to.
    pub grid_size: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    /// Grid offset from the room origin.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Snap while moving instead of on release.
    pub live_snap: bool,
    /// Freeze horizontal movement.
    pub lock_x: bool,
    /// Freeze vertical movement.
    pub lock_y: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            grid_size: 48.0,
            rect_width: 48.0,
            rect_height: 48.0,
            offset_x: 0.0,
            offset_y: 0.0,
            live_snap: false,
            lock_x: false,
            lock_y: false,
        }
    }
}

impl SandboxConfig {
    /// Offsets wrapped into one rectangle cell.
    pub fn normalized_offsets(&self) -> (f64, f64) {
        let wrap = |offset: f64, size: f64| if offset > size { offset % size } else { offset };
        (
            wrap(self.offset_x, self.rect_width),
            wrap(self.offset_y, self.rect_height),
        )
    }
}
