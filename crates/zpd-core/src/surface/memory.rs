//! In-memory surface implementation.

use super::{NodeId, Surface, SurfaceError, SurfaceResult};
use crate::matrix::{parse_transform, to_svg_transform};
use kurbo::{Affine, Rect, Size};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct MemoryNode {
    tag: String,
    element_id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Raw `transform` attribute.
    transform: Option<String>,
    /// Intrinsic geometry for leaf elements.
    bounds: Option<Rect>,
    /// Rendered size, for canvases.
    size: Option<Size>,
}

impl MemoryNode {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            element_id: None,
            parent: None,
            children: Vec::new(),
            transform: None,
            bounds: None,
            size: None,
        }
    }
}

/// Token for listeners attached to a [`MemorySurface`] canvas.
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryListeners {
    canvas: NodeId,
}

/// In-memory document tree for testing and headless use.
#[derive(Debug, Default)]
pub struct MemorySurface {
    nodes: HashMap<NodeId, MemoryNode>,
    next_id: u64,
    listening: HashSet<NodeId>,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: MemoryNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn node(&self, id: NodeId) -> SurfaceResult<&MemoryNode> {
        self.nodes.get(&id).ok_or(SurfaceError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> SurfaceResult<&mut MemoryNode> {
        self.nodes.get_mut(&id).ok_or(SurfaceError::NodeNotFound(id))
    }

    fn detach(&mut self, child: NodeId) -> SurfaceResult<()> {
        let old_parent = self.node_mut(child)?.parent.take();
        if let Some(parent) = old_parent {
            self.node_mut(parent)?.children.retain(|&c| c != child);
        }
        Ok(())
    }

    /// Add a root `<svg>` canvas with the given rendered size.
    pub fn add_canvas(&mut self, size: Size) -> NodeId {
        let mut node = MemoryNode::new("svg");
        node.size = Some(size);
        self.insert(node)
    }

    /// Append a leaf element with intrinsic bounds under `parent`.
    pub fn add_element(&mut self, parent: NodeId, tag: &str, bounds: Rect) -> SurfaceResult<NodeId> {
        self.node(parent)?;
        let mut node = MemoryNode::new(tag);
        node.bounds = Some(bounds);
        let id = self.insert(node);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Whether the node is still part of the surface.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Tag name of a node.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.tag.as_str())
    }

    /// `id` attribute of a node.
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| n.element_id.as_deref())
    }

    /// Raw `transform` attribute of a node.
    pub fn transform_attribute(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).and_then(|n| n.transform.as_deref())
    }

    /// Overwrite the raw `transform` attribute of a node.
    pub fn set_transform_attribute(&mut self, node: NodeId, value: &str) -> SurfaceResult<()> {
        self.node_mut(node)?.transform = Some(value.to_string());
        Ok(())
    }

    /// Whether listeners are currently attached to `canvas`.
    pub fn is_listening(&self, canvas: NodeId) -> bool {
        self.listening.contains(&canvas)
    }
}

impl Surface for MemorySurface {
    type Listeners = MemoryListeners;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> SurfaceResult<Vec<NodeId>> {
        Ok(self.node(node)?.children.clone())
    }

    fn create_group(&mut self, parent: NodeId, element_id: &str) -> SurfaceResult<NodeId> {
        self.node(parent)?;
        let mut node = MemoryNode::new("g");
        node.element_id = Some(element_id.to_string());
        let id = self.insert(node);
        self.append_child(parent, id)?;
        Ok(id)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> SurfaceResult<()> {
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> SurfaceResult<()> {
        self.node(child)?;
        if !self.node(parent)?.children.contains(&reference) {
            return Err(SurfaceError::NotAChild { parent, child: reference });
        }
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings.iter().position(|&c| c == reference).unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> SurfaceResult<()> {
        self.detach(node)?;
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                pending.extend(removed.children);
            }
        }
        Ok(())
    }

    fn transform(&self, node: NodeId) -> SurfaceResult<Affine> {
        match &self.node(node)?.transform {
            Some(attr) => parse_transform(attr).map_err(|_| SurfaceError::InvalidTransform(attr.clone())),
            None => Ok(Affine::IDENTITY),
        }
    }

    fn set_transform(&mut self, node: NodeId, matrix: &Affine) -> SurfaceResult<()> {
        self.node_mut(node)?.transform = Some(to_svg_transform(matrix));
        Ok(())
    }

    fn bounding_box(&self, node: NodeId) -> SurfaceResult<Option<Rect>> {
        let record = self.node(node)?;
        let mut result = record.bounds;
        for &child in &record.children {
            let Some(child_box) = self.bounding_box(child)? else {
                continue;
            };
            let placed = self.transform(child)?.transform_rect_bbox(child_box);
            result = Some(match result {
                Some(r) => r.union(placed),
                None => placed,
            });
        }
        Ok(result)
    }

    fn viewport_size(&self, canvas: NodeId) -> SurfaceResult<Size> {
        Ok(self.node(canvas)?.size.unwrap_or(Size::ZERO))
    }

    fn attach_listeners(&mut self, canvas: NodeId) -> SurfaceResult<MemoryListeners> {
        self.node(canvas)?;
        if !self.listening.insert(canvas) {
            return Err(SurfaceError::AlreadyListening(canvas));
        }
        Ok(MemoryListeners { canvas })
    }

    fn detach_listeners(&mut self, canvas: NodeId, listeners: MemoryListeners) {
        debug_assert_eq!(listeners.canvas, canvas);
        self.listening.remove(&canvas);
    }
}
