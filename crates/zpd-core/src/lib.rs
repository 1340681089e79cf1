//! ZPD Core Library
//!
//! Platform-agnostic zoom/pan/drag controller for SVG canvases: the
//! transform state, gesture routing, matrix composition and animated
//! transitions, independent of any particular host document.

pub mod animation;
pub mod commands;
pub mod composer;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod input;
pub mod matrix;
pub mod options;
pub mod snap;
pub mod surface;

pub use animation::{Completion, Easing, Transition, TransitionPlayer, TransitionTarget};
pub use commands::{PanCoord, ZpdCommand};
pub use controller::{Activation, CanvasEntry, CommandOutcome, ZpdController, GROUP_ID_PREFIX};
pub use error::{ZpdError, ZpdResult};
pub use gesture::{GestureState, InteractionMode, PinchState};
pub use input::{EventResponse, PointerEvent, TouchEvent, TouchPoint, WheelDelta};
pub use matrix::MatrixSnapshot;
pub use options::{SandboxConfig, ZoomThreshold, ZpdOptions, ZpdOptionsPatch};
pub use snap::{RectDrag, snap_to, SNAP_TOLERANCE};
pub use surface::{MemorySurface, NodeId, Surface, SurfaceError, SurfaceResult};
