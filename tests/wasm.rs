#![cfg(target_arch = "wasm32")]

use family_tree_wasm::FamilyTreeWasm;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

const GRAPH: &str = r#"{
    "Root": { "Id": "r" },
    "Persons": {
        "r": { "Id": "r", "FirstName": "Ada", "Children": ["c"], "Spouses": [{ "Id": "w" }] },
        "c": { "Id": "c", "Parents": ["r"] },
        "w": { "Id": "w", "Spouses": [{ "Id": "r" }] }
    }
}"#;

#[wasm_bindgen_test]
fn mount_cached_graph_and_render() {
    let view = FamilyTreeWasm::new(JsValue::UNDEFINED).unwrap();
    assert_eq!(view.load_graph_json(GRAPH).unwrap(), "r");

    view.mount("r".to_owned(), 800.0, 600.0, 0.0).unwrap();
    let svg = view.render_svg(500.0);
    assert!(svg.contains(r#"data-id="c""#));
    assert!(svg.contains("Ada"));
}

#[wasm_bindgen_test]
fn click_hits_node_under_pointer() {
    let view = FamilyTreeWasm::new(JsValue::UNDEFINED).unwrap();
    view.load_graph_json(GRAPH).unwrap();
    view.mount("r".to_owned(), 800.0, 600.0, 0.0).unwrap();

    assert_eq!(view.click(400.0, 500.0, 500.0).as_deref(), Some("c"));
    assert_eq!(view.click(5.0, 5.0, 500.0), None);
}

#[wasm_bindgen_test]
fn stale_fetch_is_reported() {
    let view = FamilyTreeWasm::new(JsValue::UNDEFINED).unwrap();
    view.load_graph_json(GRAPH).unwrap();
    view.mount("r".to_owned(), 800.0, 600.0, 0.0).unwrap();

    // Two uncached requests: only the second ticket is honoured
    view.request_reroot("x".to_owned(), 100.0).unwrap();
    view.request_reroot("y".to_owned(), 100.0).unwrap();
    let stale = view
        .complete_fetch(1.0, r#"{ "Root": { "Id": "x" }, "Persons": { "x": { "Id": "x" } } }"#, 200.0)
        .unwrap();
    assert!(!stale);
}
