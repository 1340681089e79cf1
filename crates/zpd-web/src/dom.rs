//! [`Surface`] implementation over the browser DOM.

use crate::runtime::Runtime;
use kurbo::{Affine, Rect, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Element, Event, SvgGraphicsElement};
use zpd_core::matrix::{parse_transform, to_svg_transform};
use zpd_core::{NodeId, Surface, SurfaceError, SurfaceResult};

/// SVG namespace for created elements.
pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Events listened to on every active canvas.
const CANVAS_EVENTS: [&str; 8] = [
    "mousedown",
    "mousemove",
    "mouseup",
    "mouseleave",
    "wheel",
    "touchstart",
    "touchmove",
    "touchend",
];

#[derive(Default)]
struct NodeRegistry {
    next: u64,
    elements: HashMap<NodeId, Element>,
}

/// DOM elements addressed by [`NodeId`].
///
/// Elements are registered lazily the first time the controller sees
/// them and matched by identity, so the document itself is never tagged.
/// Destroying a canvas forgets everything registered below it.
pub struct DomSurface {
    runtime: Weak<Runtime>,
    registry: RefCell<NodeRegistry>,
}

/// Event handlers attached to one canvas.
pub struct DomListeners {
    target: Element,
    handlers: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl DomListeners {
    fn remove_all(self) {
        for (kind, handler) in &self.handlers {
            if let Err(e) = self
                .target
                .remove_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())
            {
                log::warn!("Could not remove {} listener: {:?}", kind, e);
            }
        }
    }
}

fn host(err: JsValue) -> SurfaceError {
    SurfaceError::Host(format!("{:?}", err))
}

impl DomSurface {
    pub(crate) fn new(runtime: Weak<Runtime>) -> Self {
        Self {
            runtime,
            registry: RefCell::new(NodeRegistry::default()),
        }
    }

    /// Id of an element, registering it on first sight.
    pub fn register(&self, element: &Element) -> NodeId {
        let mut registry = self.registry.borrow_mut();
        if let Some((&id, _)) = registry.elements.iter().find(|(_, known)| *known == element) {
            return id;
        }
        registry.next += 1;
        let id = NodeId(registry.next);
        registry.elements.insert(id, element.clone());
        id
    }

    /// The element behind a node id.
    pub fn element(&self, node: NodeId) -> SurfaceResult<Element> {
        self.registry
            .borrow()
            .elements
            .get(&node)
            .cloned()
            .ok_or(SurfaceError::NodeNotFound(node))
    }

    fn forget(&self, node: NodeId) {
        self.registry.borrow_mut().elements.remove(&node);
    }
}

impl Surface for DomSurface {
    type Listeners = DomListeners;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node).ok()?.parent_element()?;
        Some(self.register(&parent))
    }

    fn children(&self, node: NodeId) -> SurfaceResult<Vec<NodeId>> {
        let collection = self.element(node)?.children();
        Ok((0..collection.length())
            .filter_map(|i| collection.item(i))
            .map(|child| self.register(&child))
            .collect())
    }

    fn create_group(&mut self, parent: NodeId, element_id: &str) -> SurfaceResult<NodeId> {
        let parent = self.element(parent)?;
        let document = parent
            .owner_document()
            .ok_or_else(|| SurfaceError::Host("canvas has no document".to_string()))?;
        let group = document.create_element_ns(Some(SVG_NS), "g").map_err(host)?;
        group.set_attribute("id", element_id).map_err(host)?;
        parent.append_child(&group).map_err(host)?;
        Ok(self.register(&group))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> SurfaceResult<()> {
        self.element(parent)?
            .append_child(&self.element(child)?)
            .map_err(host)?;
        Ok(())
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> SurfaceResult<()> {
        let reference_element = self.element(reference)?;
        self.element(parent)?
            .insert_before(&self.element(child)?, Some(&reference_element))
            .map_err(|_| SurfaceError::NotAChild { parent, child: reference })?;
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> SurfaceResult<()> {
        self.element(node)?.remove();
        self.forget(node);
        Ok(())
    }

    fn transform(&self, node: NodeId) -> SurfaceResult<Affine> {
        match self.element(node)?.get_attribute("transform") {
            Some(attr) => parse_transform(&attr).map_err(|_| SurfaceError::InvalidTransform(attr)),
            None => Ok(Affine::IDENTITY),
        }
    }

    fn set_transform(&mut self, node: NodeId, matrix: &Affine) -> SurfaceResult<()> {
        self.element(node)?
            .set_attribute("transform", &to_svg_transform(matrix))
            .map_err(host)
    }

    fn bounding_box(&self, node: NodeId) -> SurfaceResult<Option<Rect>> {
        let element = self.element(node)?;
        let Some(graphics) = element.dyn_ref::<SvgGraphicsElement>() else {
            return Ok(None);
        };
        let bbox = graphics.get_b_box().map_err(host)?;
        let (x, y) = (f64::from(bbox.x()), f64::from(bbox.y()));
        Ok(Some(Rect::new(x, y, x + f64::from(bbox.width()), y + f64::from(bbox.height()))))
    }

    fn viewport_size(&self, canvas: NodeId) -> SurfaceResult<Size> {
        let rect = self.element(canvas)?.get_bounding_client_rect();
        Ok(Size::new(rect.width(), rect.height()))
    }

    fn attach_listeners(&mut self, canvas: NodeId) -> SurfaceResult<DomListeners> {
        let target = self.element(canvas)?;
        let options = AddEventListenerOptions::new();
        // Wheel and touch defaults must stay cancellable.
        options.set_passive(false);

        let mut listeners = DomListeners {
            target: target.clone(),
            handlers: Vec::with_capacity(CANVAS_EVENTS.len()),
        };
        for kind in CANVAS_EVENTS {
            let runtime = self.runtime.clone();
            let handler = Closure::wrap(Box::new(move |event: Event| {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.dispatch(canvas, &event);
                }
            }) as Box<dyn FnMut(Event)>);

            if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                handler.as_ref().unchecked_ref(),
                &options,
            ) {
                listeners.remove_all();
                return Err(host(e));
            }
            listeners.handlers.push((kind, handler));
        }
        log::debug!("Listening on {}", canvas);
        Ok(listeners)
    }

    fn detach_listeners(&mut self, canvas: NodeId, listeners: DomListeners) {
        listeners.remove_all();
        log::debug!("Stopped listening on {}", canvas);
    }

    fn release(&mut self, canvas: NodeId) {
        let Ok(root) = self.element(canvas) else {
            return;
        };
        let mut registry = self.registry.borrow_mut();
        let before = registry.elements.len();
        registry
            .elements
            .retain(|&id, element| id == canvas || !root.contains(Some(&**element)));
        log::debug!("Released {} nodes below {}", before - registry.elements.len(), canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use zpd_core::{ZpdController, ZpdOptionsPatch};

    wasm_bindgen_test_configure!(run_in_browser);

    fn svg_with_rect() -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let svg = document.create_element_ns(Some(SVG_NS), "svg").unwrap();
        let rect = document.create_element_ns(Some(SVG_NS), "rect").unwrap();
        svg.append_child(&rect).unwrap();
        document.document_element().unwrap().append_child(&svg).unwrap();
        svg
    }

    #[wasm_bindgen_test]
    fn test_register_is_stable_and_leaves_no_attribute() {
        let svg = svg_with_rect();
        let surface = DomSurface::new(Weak::new());

        let id = surface.register(&svg);

        assert_eq!(surface.register(&svg), id);
        assert_eq!(surface.element(id).unwrap(), svg);
        assert!(!svg.has_attributes());
        svg.remove();
    }

    #[wasm_bindgen_test]
    fn test_destroy_forgets_content_and_restores_markup() {
        let svg = svg_with_rect();
        let mut zpd = ZpdController::new(DomSurface::new(Weak::new()));
        let canvas = zpd.surface().register(&svg);

        zpd.activate(canvas, ZpdOptionsPatch::new()).unwrap();
        assert_eq!(zpd.surface().registry.borrow().elements.len(), 3);
        zpd.destroy(canvas).unwrap();

        assert_eq!(zpd.surface().registry.borrow().elements.len(), 1);
        assert_eq!(zpd.surface().register(&svg), canvas);
        let rect = svg.first_element_child().unwrap();
        assert_eq!(svg.child_element_count(), 1);
        assert!(!rect.has_attributes());
        assert!(!svg.has_attributes());
        svg.remove();
    }
}
