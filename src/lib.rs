//! Family Tree - WASM Module
//!
//! Builds, lays out and animates the hourglass view of a family tree: the
//! descendants of a root person below it, the ancestors above it, siblings
//! to its left and spouses to its right. Compiled to WebAssembly and exposed
//! to JavaScript via wasm-bindgen; native hosts use [`view::FamilyTreeView`]
//! directly.
//!
//! # Architecture
//!
//! - `model`: person and family tree DTOs in their wire shape
//! - `tree`: descendant/ancestor trees and the flat sibling/spouse rows
//! - `layout`: tidy tree layout and hourglass placement
//! - `links`: parent/child, sibling and marriage links
//! - `scene`: one draw-ordered rebuild
//! - `render`: keyed enter/update/exit transitions, styles, SVG output
//! - `spatial`: R-tree hit testing
//! - `controller`: re-root cache, fetch tokens, pan/zoom
//! - `source`: fetch and loading capabilities, in-memory source
//! - `view`: the mount point tying it together

use std::cell::RefCell;

use js_sys::Function;
use log::warn;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod links;
pub mod model;
pub mod render;
pub mod scene;
pub mod source;
pub mod spatial;
pub mod tree;
pub mod view;

use config::ViewConfig;
use controller::{FetchOutcome, RerootStep};
use error::FetchError;
use model::{FamilyTreeGraph, PersonId};
use render::HandlerCell;
use source::LoadingIndicator;
use view::FamilyTreeView;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Debug);
        console_error_panic_hook::set_once();
    }
}

/// Loading callbacks supplied by JavaScript.
struct JsLoading {
    show: Function,
    hide: Function,
    error: Option<Function>,
}

impl LoadingIndicator for JsLoading {
    fn show_loading(&mut self) {
        if let Err(err) = self.show.call0(&JsValue::NULL) {
            warn!("showLoading callback threw: {err:?}");
        }
    }

    fn hide_loading(&mut self) {
        if let Err(err) = self.hide.call0(&JsValue::NULL) {
            warn!("hideLoading callback threw: {err:?}");
        }
    }

    fn show_error(&mut self, error: &FetchError) {
        let Some(callback) = &self.error else {
            return;
        };
        if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&error.to_string())) {
            warn!("showError callback threw: {err:?}");
        }
    }
}

/// Main entry point for the family tree view.
///
/// All methods take `&self` so that JavaScript callbacks fired from inside
/// a call (click handler, loading callbacks) may call back into the view.
#[wasm_bindgen]
pub struct FamilyTreeWasm {
    view: RefCell<FamilyTreeView>,
    on_click: HandlerCell<PersonId>,
    loading: RefCell<Option<JsLoading>>,
}

#[wasm_bindgen]
impl FamilyTreeWasm {
    /// Create a view. `config` is a partial `ViewConfig` object or undefined.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<FamilyTreeWasm, JsError> {
        let config: ViewConfig = if config.is_undefined() || config.is_null() {
            ViewConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let view = FamilyTreeView::new(config);
        Ok(Self {
            on_click: view.handler_cell(),
            view: RefCell::new(view),
            loading: RefCell::new(None),
        })
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Cache a family tree given as wire JSON. Returns its root id.
    #[wasm_bindgen(js_name = loadGraphJson)]
    pub fn load_graph_json(&self, json: &str) -> Result<String, JsError> {
        let graph = FamilyTreeGraph::from_json(json)?;
        Ok(self.view.borrow_mut().load_graph(graph).0)
    }

    /// Cache a family tree given as a JS object. Returns its root id.
    #[wasm_bindgen(js_name = loadGraph)]
    pub fn load_graph(&self, graph: JsValue) -> Result<String, JsError> {
        let graph: FamilyTreeGraph = serde_wasm_bindgen::from_value(graph)?;
        Ok(self.view.borrow_mut().load_graph(graph).0)
    }

    // =========================================================================
    // Re-rooting
    // =========================================================================

    /// Attach to a viewport and request the initial root.
    ///
    /// Returns `{ ready: id }` when the tree is cached and was shown, or
    /// `{ fetch: { token, root, distance } }` when the host has to fetch it.
    pub fn mount(
        &self,
        initial_root: String,
        width: f64,
        height: f64,
        now_ms: f64,
    ) -> Result<JsValue, JsError> {
        let step = self
            .view
            .borrow_mut()
            .mount(initial_root.into(), width, height);
        self.begin(step, now_ms)
    }

    /// Ask for a new root. Same return value as [`FamilyTreeWasm::mount`].
    #[wasm_bindgen(js_name = requestReroot)]
    pub fn request_reroot(&self, id: String, now_ms: f64) -> Result<JsValue, JsError> {
        let step = self.view.borrow_mut().request_reroot(id.into())?;
        self.begin(step, now_ms)
    }

    /// Hand in the wire JSON fetched for `token`.
    ///
    /// Returns `false` if the response was superseded by a newer request.
    #[wasm_bindgen(js_name = completeFetch)]
    pub fn complete_fetch(&self, token: f64, json: &str, now_ms: f64) -> Result<bool, JsError> {
        let result = FamilyTreeGraph::from_json(json);
        self.finish(token, result, now_ms)
    }

    /// Report that the fetch for `token` failed.
    #[wasm_bindgen(js_name = failFetch)]
    pub fn fail_fetch(&self, token: f64, message: String) -> Result<bool, JsError> {
        self.finish(token, Err(FetchError::Network(message)), 0.0)
    }

    /// Rebuild around a cached root and return the render plan.
    pub fn show(&self, root_id: String, now_ms: f64) -> Result<JsValue, JsError> {
        let plan = self.view.borrow_mut().show(&root_id.into(), now_ms)?;
        Ok(serde_wasm_bindgen::to_value(&plan)?)
    }

    /// Current fetch state: `{ state: "idle" | "loading" | "failed", message? }`.
    pub fn status(&self) -> Result<JsValue, JsError> {
        let view = self.view.borrow();
        Ok(serde_wasm_bindgen::to_value(view.controller().status())?)
    }

    // =========================================================================
    // Host callbacks
    // =========================================================================

    /// Set the click handler, called with the id of the clicked person.
    #[wasm_bindgen(js_name = setClickHandler)]
    pub fn set_click_handler(&self, handler: Function) {
        self.on_click.set(move |id: &PersonId| {
            if let Err(err) = handler.call1(&JsValue::NULL, &JsValue::from_str(id.as_str())) {
                warn!("click handler threw: {err:?}");
            }
        });
    }

    #[wasm_bindgen(js_name = clearClickHandler)]
    pub fn clear_click_handler(&self) {
        self.on_click.clear();
    }

    /// Set the spinner callbacks. `error` receives the failure message.
    #[wasm_bindgen(js_name = setLoadingCallbacks)]
    pub fn set_loading_callbacks(&self, show: Function, hide: Function, error: Option<Function>) {
        *self.loading.borrow_mut() = Some(JsLoading { show, hide, error });
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Hit test a screen point and call the click handler on a hit.
    pub fn click(&self, screen_x: f64, screen_y: f64, now_ms: f64) -> Option<String> {
        // The handler may re-enter, so the view borrow ends before the call
        let id = self.view.borrow().hit_test(screen_x, screen_y, now_ms)?;
        self.on_click.call(&id);
        Some(id.0)
    }

    #[wasm_bindgen(js_name = zoomBy)]
    pub fn zoom_by(&self, factor: f64, cx: f64, cy: f64, now_ms: f64) -> Result<JsValue, JsError> {
        let transform = self.view.borrow_mut().zoom_by(factor, cx, cy, now_ms);
        Ok(serde_wasm_bindgen::to_value(&transform)?)
    }

    #[wasm_bindgen(js_name = panBy)]
    pub fn pan_by(&self, dx: f64, dy: f64, now_ms: f64) -> Result<JsValue, JsError> {
        let transform = self.view.borrow_mut().pan_by(dx, dy, now_ms);
        Ok(serde_wasm_bindgen::to_value(&transform)?)
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.view.borrow_mut().resize(width, height);
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// View transform `{ x, y, k }` at `now_ms`.
    pub fn transform(&self, now_ms: f64) -> Result<JsValue, JsError> {
        let transform = self.view.borrow().transform(now_ms);
        Ok(serde_wasm_bindgen::to_value(&transform)?)
    }

    /// Interpolated links and nodes at `now_ms`.
    pub fn frame(&self, now_ms: f64) -> Result<JsValue, JsError> {
        let frame = self.view.borrow_mut().frame(now_ms);
        Ok(serde_wasm_bindgen::to_value(&frame)?)
    }

    /// Standalone SVG document of the frame at `now_ms`.
    #[wasm_bindgen(js_name = renderSvg)]
    pub fn render_svg(&self, now_ms: f64) -> String {
        self.view.borrow_mut().render_svg(now_ms)
    }
}

impl FamilyTreeWasm {
    fn begin(&self, step: RerootStep, now_ms: f64) -> Result<JsValue, JsError> {
        match &step {
            RerootStep::Ready(id) => {
                self.view.borrow_mut().show(id, now_ms)?;
                self.with_loading(|loading| loading.hide_loading());
            }
            RerootStep::Fetch(_) => self.with_loading(|loading| loading.show_loading()),
        }
        Ok(serde_wasm_bindgen::to_value(&step)?)
    }

    fn finish(
        &self,
        token: f64,
        result: Result<FamilyTreeGraph, FetchError>,
        now_ms: f64,
    ) -> Result<bool, JsError> {
        let outcome = self.view.borrow_mut().complete_fetch(token as u64, result);
        match outcome {
            FetchOutcome::Ready(id) => {
                self.with_loading(|loading| loading.hide_loading());
                self.view.borrow_mut().show(&id, now_ms)?;
                Ok(true)
            }
            FetchOutcome::Stale => Ok(false),
            FetchOutcome::Failed(error) => {
                self.with_loading(|loading| loading.show_error(&error));
                Err(error.into())
            }
        }
    }

    fn with_loading(&self, f: impl FnOnce(&mut JsLoading)) {
        // Taken out while calling so a callback may replace the callbacks
        let taken = self.loading.borrow_mut().take();
        if let Some(mut loading) = taken {
            f(&mut loading);
            let mut slot = self.loading.borrow_mut();
            if slot.is_none() {
                *slot = Some(loading);
            }
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::{HourglassConfig, LAYOUT_HEIGHT, LAYOUT_WIDTH};
    use crate::links::LinkData;
    use crate::render::{Phase, Reconciler, Visual};
    use crate::scene::HourglassScene;
    use crate::source::{LocalSource, NoLoadingIndicator};
    use crate::tree::NodeRole;

    fn wire_graph() -> FamilyTreeGraph {
        let json = serde_json::json!({
            "Root": { "Id": "r" },
            "Persons": {
                "r": {
                    "Id": "r", "FirstName": "Root", "Gender": "m",
                    "Parents": ["f", "m"],
                    "Children": ["c", "gone"],
                    "Siblings": [{ "Id": "gone-sib" }, { "Id": "s", "IsHalf": true }],
                    "Spouses": [{ "Id": "w1", "SinceYear": 2015 }, { "Id": "w2", "SinceYear": 2005 }]
                },
                "f": { "Id": "f", "Gender": "m", "IsDead": true, "Children": ["r", "s"],
                       "Spouses": [{ "Id": "m" }] },
                "m": { "Id": "m", "Gender": "f", "IsDead": false, "Children": ["r", "s"],
                       "Spouses": [{ "Id": "f" }] },
                "s": { "Id": "s", "Parents": ["f"] },
                "w1": { "Id": "w1", "Gender": "f", "Spouses": [{ "Id": "r" }] },
                "w2": { "Id": "w2", "Gender": "f", "Spouses": [{ "Id": "r" }] },
                "c": { "Id": "c", "Parents": ["r", "w1"], "Spouses": [{ "Id": "cs", "SinceYear": 2040 }] },
                "cs": { "Id": "cs", "Spouses": [{ "Id": "c" }] }
            }
        });
        FamilyTreeGraph::from_json(&json.to_string()).unwrap()
    }

    /// JSON in, laid out scene out: roles, positions and links.
    #[test]
    fn test_wire_json_to_scene() {
        let graph = wire_graph();
        let scene = HourglassScene::build(&graph, &HourglassConfig::default()).unwrap();

        let root = scene.root();
        assert_eq!((root.id().as_str(), root.x, root.y), ("r", 0.0, 0.0));

        // Present spouses to the right, slots counted over the full list
        let w1 = scene.node(&"w1".into()).unwrap();
        let w2 = scene.node(&"w2".into()).unwrap();
        assert_eq!((w1.role, w1.x, w1.y), (NodeRole::RootSpouse, LAYOUT_WIDTH, 0.0));
        assert_eq!((w2.role, w2.x, w2.y), (NodeRole::RootSpouse, 2.0 * LAYOUT_WIDTH, 0.0));

        // The missing first sibling still takes a slot
        let s = scene.node(&"s".into()).unwrap();
        assert_eq!((s.role, s.x), (NodeRole::Sibling, -2.0 * LAYOUT_WIDTH));

        // Ancestors above, descendants below
        assert_eq!(scene.node(&"f".into()).unwrap().y, -LAYOUT_HEIGHT);
        assert_eq!(scene.node(&"c".into()).unwrap().y, LAYOUT_HEIGHT);
        assert_eq!(
            scene.node(&"cs".into()).unwrap().role,
            NodeRole::DescendantSpouse
        );

        // Missing child is dropped without a trace
        assert!(scene.node(&"gone".into()).is_none());

        let spouse_links: Vec<_> = scene
            .links
            .iter()
            .filter_map(|link| match &link.data {
                Some(LinkData::Spouse(data)) => Some((link.key(), data.nodes_in_between)),
                None => None,
            })
            .collect();
        assert_eq!(
            spouse_links,
            [
                ("r--w2".to_owned(), Some(1)),
                ("r--w1".to_owned(), Some(0)),
                ("c--cs".to_owned(), Some(0)),
                ("f--m".to_owned(), None),
            ]
        );
    }

    /// Re-rooting through a view keeps shared persons and fades the rest.
    #[test]
    fn test_reroot_pipeline() {
        let graph = wire_graph();
        let mut view = FamilyTreeView::default();
        view.load_graph(graph.clone());

        let step = view.mount("r".into(), 1024.0, 768.0);
        assert_eq!(step, RerootStep::Ready("r".into()));
        view.show(&"r".into(), 0.0).unwrap();

        // Re-root on the child with a second graph cut around it
        let child_graph = FamilyTreeGraph::new(
            "c",
            graph
                .persons
                .values()
                .filter(|p| ["c", "cs", "r", "w1"].contains(&p.id.as_str()))
                .cloned(),
        )
        .unwrap();
        view.load_graph(child_graph);
        let plan = view.show(&"c".into(), 1000.0).unwrap();

        let phase_of = |id: &str| {
            plan.nodes
                .iter()
                .find(|element| element.key == render::ElementKey::Node(id.into()))
                .map(|element| element.phase)
        };
        assert_eq!(phase_of("c"), Some(Phase::Update));
        assert_eq!(phase_of("r"), Some(Phase::Update));
        assert_eq!(phase_of("s"), Some(Phase::Exit));

        // After the transition the exits are gone and the child sits at the origin
        let frame = view.frame(1500.0);
        assert!(frame.node(&"s".into()).is_none());
        let child = frame.node(&"c".into()).unwrap();
        assert!(matches!(child.visual, Visual::Node { x, y, opacity } if x == 0.0 && y == 0.0 && opacity == 1.0));
    }

    /// Unknown death state is its own marker, distinct from alive and dead.
    #[test]
    fn test_death_markers_in_svg() {
        let graph = wire_graph();
        let scene = HourglassScene::build(&graph, &HourglassConfig::default()).unwrap();
        let mut reconciler = Reconciler::default();
        reconciler.reconcile(&scene, 0.0);

        let frame = reconciler.frame(500.0);
        let svg = render::render_frame(
            &frame,
            &controller::ViewTransform::centered(1024.0, 768.0, 1.0),
            (1024.0, 768.0),
            &HourglassConfig::default(),
        );
        assert!(svg.contains(r#"class="node node-ancestor dead" data-id="f""#));
        assert!(svg.contains(r#"class="node node-ancestor alive" data-id="m""#));
        assert!(svg.contains(r#"class="node node-root unknown" data-id="r""#));
    }

    /// A local source behind the view only fetches each root once.
    #[test]
    fn test_local_source_round_trip() {
        let complete = serde_json::json!({
            "Persons": [
                { "Id": "a", "Gender": "m" },
                { "Id": "b", "Gender": "f" },
                { "Id": "k" }
            ],
            "Marriages": [{ "Person1Id": "a", "Person2Id": "b" }],
            "Parents": [
                { "ParentId": "b", "ChildId": "k" },
                { "ParentId": "a", "ChildId": "k" }
            ],
            "Siblings": []
        });
        let mut source = LocalSource::from_json(&complete.to_string()).unwrap();
        let mut loading = NoLoadingIndicator;
        let mut view = FamilyTreeView::default();

        let step = view.mount("k".into(), 800.0, 600.0);
        view.drive(step, &mut source, &mut loading, 0.0).unwrap();
        let scene = view.scene().unwrap();
        // Father first in the ancestor row
        assert!(scene.node(&"a".into()).unwrap().x < scene.node(&"b".into()).unwrap().x);

        for (now, id) in [(1000.0, "a"), (2000.0, "k"), (3000.0, "a")] {
            view.reroot_with(&mut source, &mut loading, id.into(), now)
                .unwrap();
        }
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(view.controller().current_root().map(PersonId::as_str), Some("a"));
    }
}
