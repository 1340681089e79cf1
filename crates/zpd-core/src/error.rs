//! Controller errors.

use crate::surface::SurfaceError;
use thiserror::Error;

/// Errors reported by the zoom/pan/drag controller.
///
/// Validation errors never change any state: the rejected call is logged
/// and returned, and the canvas keeps its previous transform.
#[derive(Debug, Error)]
pub enum ZpdError {
    #[error("zoom factor must be a positive number, got {0}")]
    InvalidZoom(f64),
    #[error("rotation angle must be a positive number, got {0}")]
    InvalidAngle(f64),
    #[error("invalid pan coordinate: {0:?}")]
    InvalidPanCoord(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("unknown easing: {0:?}")]
    UnknownEasing(String),
    #[error("invalid transform: {0:?}")]
    InvalidTransform(String),
    #[error("matrix is not invertible: {0}")]
    SingularMatrix(String),
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for controller operations.
pub type ZpdResult<T> = Result<T, ZpdError>;
