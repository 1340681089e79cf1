#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::Element;
use zpd_web::{ZpdPaper, ZpdRuntime};

wasm_bindgen_test_configure!(run_in_browser);

const SVG_NS: &str = "http://www.w3.org/2000/svg";

type Recorder = Closure<dyn FnMut(JsValue, JsValue)>;

fn svg_canvas() -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let svg = document.create_element_ns(Some(SVG_NS), "svg").unwrap();
    let rect = document.create_element_ns(Some(SVG_NS), "rect").unwrap();
    svg.append_child(&rect).unwrap();
    document.document_element().unwrap().append_child(&svg).unwrap();
    svg
}

fn paper(svg: &Element) -> ZpdPaper {
    ZpdRuntime::new().paper(svg).unwrap()
}

/// A `(err, value)` callback collecting every `value` it is called with.
fn recorder() -> (Recorder, Rc<RefCell<Vec<JsValue>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let closure = Closure::wrap(Box::new(move |_err: JsValue, value: JsValue| {
        sink.borrow_mut().push(value);
    }) as Box<dyn FnMut(JsValue, JsValue)>);
    (closure, seen)
}

#[wasm_bindgen_test]
fn test_bare_callback_activates_and_receives_group() {
    let svg = svg_canvas();
    let paper = paper(&svg);
    let (callback, seen) = recorder();

    let returned = paper.zpd(callback.as_ref().clone(), None).unwrap();

    assert!(returned.is_undefined());
    let group = paper.get_underlying_group().unwrap().unwrap();
    assert_eq!(group.parent_element(), Some(svg.clone()));
    assert_eq!(*seen.borrow(), vec![JsValue::from(group)]);
    svg.remove();
}

#[wasm_bindgen_test]
fn test_options_callback_receives_group() {
    let svg = svg_canvas();
    let paper = paper(&svg);
    let (callback, seen) = recorder();

    paper
        .zpd(JsValue::UNDEFINED, Some(callback.as_ref().clone().unchecked_into()))
        .unwrap();

    let group = paper.get_underlying_group().unwrap().unwrap();
    assert_eq!(*seen.borrow(), vec![JsValue::from(group)]);
    svg.remove();
}

#[wasm_bindgen_test]
fn test_destroy_reports_removed_group() {
    let svg = svg_canvas();
    let paper = paper(&svg);
    paper.zpd(JsValue::UNDEFINED, None).unwrap();
    let group = paper.get_underlying_group().unwrap().unwrap();
    let (callback, seen) = recorder();

    let returned = paper
        .zpd(JsValue::from_str("destroy"), Some(callback.as_ref().clone().unchecked_into()))
        .unwrap();

    assert!(returned.is_undefined());
    assert_eq!(*seen.borrow(), vec![JsValue::from(group.clone())]);
    assert_eq!(group.parent_element(), None);
    assert_eq!(paper.get_underlying_group().unwrap(), None);
    svg.remove();
}

#[wasm_bindgen_test]
fn test_save_returns_and_reports_matrix() {
    let svg = svg_canvas();
    let paper = paper(&svg);
    let (callback, seen) = recorder();

    let returned = paper
        .zpd(JsValue::from_str("save"), Some(callback.as_ref().clone().unchecked_into()))
        .unwrap();

    let a = js_sys::Reflect::get(&returned, &JsValue::from_str("a")).unwrap();
    assert_eq!(a.as_f64(), Some(1.0));
    assert_eq!(*seen.borrow(), vec![returned]);
    svg.remove();
}

#[wasm_bindgen_test]
fn test_pan_to_rejects_non_finite_numbers() {
    let svg = svg_canvas();
    let paper = paper(&svg);
    paper.zpd(JsValue::UNDEFINED, None).unwrap();

    let nan = paper.pan_to(JsValue::from_f64(f64::NAN), JsValue::UNDEFINED, None, None, None);
    let infinite = paper.pan_to(JsValue::UNDEFINED, JsValue::from_f64(f64::INFINITY), None, None, None);

    assert!(nan.is_err());
    assert!(infinite.is_err());
    svg.remove();
}
