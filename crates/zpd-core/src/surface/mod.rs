//! Host graphics surface abstraction.
//!
//! The controller never touches a document directly: everything it
//! needs from the host (tree edits, transform attributes, bounding
//! boxes, listener registration) goes through [`Surface`].

mod memory;

pub use memory::{MemoryListeners, MemorySurface};

use kurbo::{Affine, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a node in the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("Unparseable transform attribute: {0:?}")]
    InvalidTransform(String),
    #[error("Listeners already attached to {0}")]
    AlreadyListening(NodeId),
    #[error("Host error: {0}")]
    Host(String),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// A host document the controller can drive.
///
/// Implementations exist for an in-memory tree (tests, headless use) and
/// for the browser DOM (the `zpd-web` crate).
pub trait Surface {
    /// Handles returned when listeners are attached; given back on detach.
    type Listeners;

    /// Parent of a node, if it is attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of a node, in document order.
    fn children(&self, node: NodeId) -> SurfaceResult<Vec<NodeId>>;

    /// Create an empty group element appended as the last child of `parent`.
    fn create_group(&mut self, parent: NodeId, element_id: &str) -> SurfaceResult<NodeId>;

    /// Move `child` to the end of `parent`'s children.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> SurfaceResult<()>;

    /// Move `child` into `parent` right before `reference`.
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> SurfaceResult<()>;

    /// Detach a node from the tree.
    fn remove(&mut self, node: NodeId) -> SurfaceResult<()>;

    /// The node's own transform, parsed from its `transform` attribute.
    fn transform(&self, node: NodeId) -> SurfaceResult<Affine>;

    /// Write `matrix(a,b,c,d,e,f)` into the node's `transform` attribute.
    fn set_transform(&mut self, node: NodeId, matrix: &Affine) -> SurfaceResult<()>;

    /// Bounding box of the node's content in its own coordinate space.
    fn bounding_box(&self, node: NodeId) -> SurfaceResult<Option<Rect>>;

    /// Rendered size of a canvas element.
    fn viewport_size(&self, canvas: NodeId) -> SurfaceResult<Size>;

    /// Start delivering input events for `canvas` to the controller.
    fn attach_listeners(&mut self, canvas: NodeId) -> SurfaceResult<Self::Listeners>;

    /// Stop delivering input events for `canvas`.
    fn detach_listeners(&mut self, canvas: NodeId, listeners: Self::Listeners);

    /// Drop any per-node bookkeeping below `canvas` once it is no longer
    /// managed. The canvas itself stays addressable.
    fn release(&mut self, _canvas: NodeId) {}
}

/// Move every current child of `canvas` into a new group, keeping order.
pub fn wrap_children<S: Surface + ?Sized>(
    surface: &mut S,
    canvas: NodeId,
    element_id: &str,
) -> SurfaceResult<NodeId> {
    let existing = surface.children(canvas)?;
    let group = surface.create_group(canvas, element_id)?;
    for child in existing {
        surface.append_child(group, child)?;
    }
    Ok(group)
}

/// Remove a group, putting its children back in its place.
pub fn unwrap_group<S: Surface + ?Sized>(surface: &mut S, group: NodeId) -> SurfaceResult<()> {
    let Some(parent) = surface.parent(group) else {
        return Ok(());
    };
    for child in surface.children(group)? {
        surface.insert_before(parent, child, group)?;
    }
    surface.remove(group)
}
