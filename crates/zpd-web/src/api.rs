//! JavaScript API.
//!
//! ```js
//! const zpd = new ZpdRuntime();
//! const paper = zpd.paper(document.getElementById("svg"));
//! paper.zpd({ zoomThreshold: [0.2, 5] });
//! paper.zoomTo(2, 400, "easeinout", () => console.log("done"));
//! const saved = paper.zpd("save");
//! ```

use crate::convert::{duration_ms, easing};
use crate::runtime::{Runtime, call_back};
use js_sys::Function;
use kurbo::{Affine, Point};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;
use zpd_core::{
    CommandOutcome, MatrixSnapshot, NodeId, PanCoord, ZpdCommand, ZpdError, ZpdOptionsPatch,
};

fn js_error(e: ZpdError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn is_missing(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// `panTo` coordinate: a number, a `"+n"`/`"-n"` string, or nothing.
fn pan_coord(value: &JsValue) -> Result<Option<PanCoord>, JsValue> {
    if is_missing(value) {
        return Ok(None);
    }
    if let Some(number) = value.as_f64() {
        if !number.is_finite() {
            return Err(js_error(ZpdError::InvalidPanCoord(number.to_string())));
        }
        return Ok(Some(PanCoord::Absolute(number)));
    }
    match value.as_string() {
        Some(text) => text.parse().map(Some).map_err(js_error),
        None => Err(js_error(ZpdError::InvalidPanCoord(format!("{:?}", value)))),
    }
}

/// Owns one controller; create one per page.
#[wasm_bindgen]
pub struct ZpdRuntime {
    runtime: Rc<Runtime>,
}

#[wasm_bindgen]
impl ZpdRuntime {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ZpdRuntime {
        ZpdRuntime { runtime: Runtime::new() }
    }

    /// Bind an `<svg>` element.
    pub fn paper(&self, svg: &Element) -> Result<ZpdPaper, JsValue> {
        let canvas = self.runtime.with(|zpd| zpd.surface().register(svg))?;
        Ok(ZpdPaper::new(Rc::clone(&self.runtime), canvas))
    }

    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> Result<bool, JsValue> {
        self.runtime.with(|zpd| zpd.is_animating())
    }
}

impl Default for ZpdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Zoom/pan/drag methods of one `<svg>` canvas.
#[wasm_bindgen]
pub struct ZpdPaper {
    runtime: Rc<Runtime>,
    canvas: NodeId,
}

impl ZpdPaper {
    pub(crate) fn new(runtime: Rc<Runtime>, canvas: NodeId) -> Self {
        Self { runtime, canvas }
    }

    pub(crate) fn canvas(&self) -> NodeId {
        self.canvas
    }

    pub(crate) fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// The wrapping group as a JS value; `undefined` when inactive.
    fn group_value(&self) -> Result<JsValue, JsValue> {
        Ok(self.get_underlying_group()?.map_or(JsValue::UNDEFINED, JsValue::from))
    }

    fn snapshot(matrix: Option<Affine>) -> Result<JsValue, JsValue> {
        match matrix {
            Some(matrix) => Ok(serde_wasm_bindgen::to_value(&MatrixSnapshot::from(matrix))?),
            None => Ok(JsValue::NULL),
        }
    }
}

#[wasm_bindgen]
impl ZpdPaper {
    /// Activate with an options object or a bare callback, or run
    /// `"destroy"`, `"save"` or `"origin"`.
    ///
    /// The callback receives `(null, matrix)` for `"save"` and
    /// `(null, group)` otherwise. Only `"save"` returns a value.
    pub fn zpd(&self, options: JsValue, callback: Option<Function>) -> Result<JsValue, JsValue> {
        let (options, callback) = match options.dyn_into::<Function>() {
            Ok(function) => (JsValue::UNDEFINED, Some(function)),
            Err(options) => (options, callback),
        };

        let (value, reported) = if let Some(name) = options.as_string() {
            let command: ZpdCommand = name.parse().map_err(js_error)?;
            // Activate up front so the group exists to report, even once destroyed.
            self.runtime
                .with(|zpd| {
                    if zpd.is_active(self.canvas) {
                        Ok(())
                    } else {
                        zpd.activate(self.canvas, ZpdOptionsPatch::new()).map(|_| ())
                    }
                })?
                .map_err(js_error)?;
            let group = self.group_value()?;
            let outcome = self
                .runtime
                .with(|zpd| zpd.command(self.canvas, command))?
                .map_err(js_error)?;
            match outcome {
                CommandOutcome::Saved(matrix) => {
                    let matrix = serde_wasm_bindgen::to_value(&matrix)?;
                    (matrix.clone(), matrix)
                }
                CommandOutcome::OriginStarted => {
                    self.runtime.request_frame();
                    (JsValue::UNDEFINED, group)
                }
                CommandOutcome::Destroyed => (JsValue::UNDEFINED, group),
            }
        } else {
            let patch: ZpdOptionsPatch = if is_missing(&options) {
                ZpdOptionsPatch::new()
            } else {
                serde_wasm_bindgen::from_value(options)?
            };
            self.runtime
                .with(|zpd| zpd.activate(self.canvas, patch))?
                .map_err(js_error)?;
            (JsValue::UNDEFINED, self.group_value()?)
        };

        if let Some(callback) = callback {
            call_back(&callback, &reported);
        }
        Ok(value)
    }

    #[wasm_bindgen(js_name = zoomTo)]
    pub fn zoom_to(
        &self,
        zoom: f64,
        interval: Option<f64>,
        ease: Option<String>,
        callback: Option<Function>,
    ) -> Result<(), JsValue> {
        let done = self.runtime.completion(callback);
        self.runtime
            .with(|zpd| zpd.zoom_to(self.canvas, zoom, duration_ms(interval), easing(ease.as_deref()), done))?
            .map_err(js_error)?;
        self.runtime.request_frame();
        Ok(())
    }

    #[wasm_bindgen(js_name = zoomToNoPan)]
    pub fn zoom_to_no_pan(&self, zoom: f64) -> Result<(), JsValue> {
        self.runtime
            .with(|zpd| zpd.zoom_to_no_pan(self.canvas, zoom))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = panTo)]
    pub fn pan_to(
        &self,
        x: JsValue,
        y: JsValue,
        interval: Option<f64>,
        ease: Option<String>,
        callback: Option<Function>,
    ) -> Result<(), JsValue> {
        let (x, y) = (pan_coord(&x)?, pan_coord(&y)?);
        let done = self.runtime.completion(callback);
        self.runtime
            .with(|zpd| zpd.pan_to(self.canvas, x, y, duration_ms(interval), easing(ease.as_deref()), done))?
            .map_err(js_error)?;
        self.runtime.request_frame();
        Ok(())
    }

    #[wasm_bindgen(js_name = panToPoint)]
    pub fn pan_to_point(&self, x: f64, y: f64) -> Result<(), JsValue> {
        self.runtime
            .with(|zpd| zpd.pan_to_point(self.canvas, Point::new(x, y)))?
            .map_err(js_error)
    }

    pub fn rotate(
        &self,
        angle: f64,
        x: Option<f64>,
        y: Option<f64>,
        interval: Option<f64>,
        ease: Option<String>,
        callback: Option<Function>,
    ) -> Result<(), JsValue> {
        let pivot = (x.is_some() || y.is_some()).then(|| Point::new(x.unwrap_or(0.0), y.unwrap_or(0.0)));
        let done = self.runtime.completion(callback);
        self.runtime
            .with(|zpd| {
                zpd.rotate(self.canvas, angle, pivot, duration_ms(interval), easing(ease.as_deref()), done)
            })?
            .map_err(js_error)?;
        self.runtime.request_frame();
        Ok(())
    }

    #[wasm_bindgen(js_name = getCurrentZoom)]
    pub fn get_current_zoom(&self) -> Result<Option<f64>, JsValue> {
        self.runtime.with(|zpd| zpd.get_current_zoom(self.canvas))
    }

    #[wasm_bindgen(js_name = getCTM)]
    pub fn get_ctm(&self) -> Result<JsValue, JsValue> {
        let matrix = self.runtime.with(|zpd| zpd.get_ctm(self.canvas))?;
        Self::snapshot(matrix)
    }

    /// Replace the matrix; `null` or no argument resets to identity.
    #[wasm_bindgen(js_name = setCTM)]
    pub fn set_ctm(&self, matrix: JsValue) -> Result<(), JsValue> {
        let matrix = if is_missing(&matrix) {
            None
        } else {
            let snapshot: MatrixSnapshot = serde_wasm_bindgen::from_value(matrix)?;
            Some(Affine::from(snapshot))
        };
        self.runtime
            .with(|zpd| zpd.set_ctm(self.canvas, matrix))?
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = flipY)]
    pub fn flip_y(&self) -> Result<(), JsValue> {
        self.runtime.with(|zpd| zpd.flip_y(self.canvas))?.map_err(js_error)
    }

    /// The `<g>` wrapping the canvas content, for adding elements without a redraw.
    #[wasm_bindgen(js_name = getZPDel)]
    pub fn get_underlying_group(&self) -> Result<Option<Element>, JsValue> {
        self.runtime.with(|zpd| {
            zpd.get_underlying_group(self.canvas)
                .and_then(|group| zpd.surface().element(group).ok())
        })
    }
}
