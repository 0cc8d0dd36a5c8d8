//! The mount point of a family tree.
//!
//! [`FamilyTreeView`] owns everything a rendered tree needs between frames:
//! the re-root controller with its graph cache, the keyed reconciler, the hit
//! test index and the click handler. Hosts drive it with clicks, fetch
//! completions and `now` timestamps, and draw the frames it hands back.

use log::{info, warn};

use crate::config::ViewConfig;
use crate::controller::{FetchOutcome, ReRootController, RerootStep, ViewTransform};
use crate::error::{FetchError, ViewError};
use crate::model::{FamilyTreeGraph, PersonId};
use crate::render::{render_frame, Frame, HandlerCell, Reconciler, RenderPlan};
use crate::scene::HourglassScene;
use crate::source::{FamilyTreeSource, LoadingIndicator};
use crate::spatial::SpatialIndex;

/// An interactive hourglass view.
pub struct FamilyTreeView {
    config: ViewConfig,
    controller: ReRootController,
    reconciler: Reconciler,
    spatial: SpatialIndex,
    on_click: HandlerCell<PersonId>,
    scene: Option<HourglassScene>,
    mounted: bool,
}

impl FamilyTreeView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            controller: ReRootController::new(config.clone()),
            reconciler: Reconciler::new(config.hourglass.clone(), config.transition_ms),
            spatial: SpatialIndex::new(),
            on_click: HandlerCell::new(),
            scene: None,
            mounted: false,
            config,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn controller(&self) -> &ReRootController {
        &self.controller
    }

    /// The scene on screen, if anything was shown yet.
    pub fn scene(&self) -> Option<&HourglassScene> {
        self.scene.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// A handle on the click handler. Clones share the same slot.
    pub fn handler_cell(&self) -> HandlerCell<PersonId> {
        self.on_click.clone()
    }

    /// Replace the click handler. Bindings made earlier see the new one.
    pub fn set_click_handler(&self, handler: impl Fn(&PersonId) + 'static) {
        self.on_click.set(handler);
    }

    /// Put a graph into the cache without showing it.
    pub fn load_graph(&mut self, graph: FamilyTreeGraph) -> PersonId {
        self.controller.insert(graph)
    }

    /// Attach to a viewport and request the initial root.
    pub fn mount(&mut self, initial_root: PersonId, width: f64, height: f64) -> RerootStep {
        self.controller.set_viewport(width, height);
        self.mounted = true;
        info!("mounted family tree view ({width}x{height}) at '{initial_root}'");
        self.controller.request_root(initial_root)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.controller.set_viewport(width, height);
    }

    /// Ask for `id` to become the root.
    pub fn request_reroot(&mut self, id: PersonId) -> Result<RerootStep, ViewError> {
        if !self.mounted {
            return Err(ViewError::NotMounted);
        }
        Ok(self.controller.request_root(id))
    }

    pub fn complete_fetch(
        &mut self,
        token: u64,
        result: Result<FamilyTreeGraph, FetchError>,
    ) -> FetchOutcome {
        self.controller.complete_fetch(token, result)
    }

    /// Rebuild around the cached graph of `root_id` and start the transitions.
    ///
    /// The first call places the tree without animation. Later calls animate
    /// nodes and the view transform from wherever they are at `now_ms`.
    pub fn show(&mut self, root_id: &PersonId, now_ms: f64) -> Result<RenderPlan, ViewError> {
        if !self.mounted {
            return Err(ViewError::NotMounted);
        }

        // The controller only switches once the scene exists
        let graph = self
            .controller
            .cached(root_id)
            .ok_or_else(|| ViewError::UnknownRoot(root_id.clone()))?;
        let scene = HourglassScene::build(graph, &self.config.hourglass)
            .ok_or_else(|| ViewError::UnknownRoot(root_id.clone()))?;
        self.controller.activate(root_id)?;

        let plan = self.reconciler.reconcile(&scene, now_ms);
        self.spatial.rebuild(
            self.reconciler
                .node_targets()
                .map(|(id, x, y)| (id.clone(), x, y)),
        );

        let (width, height) = self.controller.viewport();
        self.controller
            .set_extent(scene.bounds(width as f32, height as f32));
        let animate = self.scene.is_some();
        self.controller.recenter(now_ms, animate);

        self.scene = Some(scene);
        Ok(plan)
    }

    /// Carry a re-root step through a synchronous source.
    ///
    /// The spinner is shown around the fetch and hidden on success. On
    /// failure the error is reported and the spinner stays up.
    pub fn drive<S, L>(
        &mut self,
        step: RerootStep,
        source: &mut S,
        loading: &mut L,
        now_ms: f64,
    ) -> Result<RenderPlan, ViewError>
    where
        S: FamilyTreeSource + ?Sized,
        L: LoadingIndicator + ?Sized,
    {
        match step {
            RerootStep::Ready(id) => self.show(&id, now_ms),
            RerootStep::Fetch(ticket) => {
                loading.show_loading();
                let result = source.fetch_family_tree(&ticket.root, ticket.distance);
                match self.complete_fetch(ticket.token, result) {
                    FetchOutcome::Ready(id) => {
                        loading.hide_loading();
                        self.show(&id, now_ms)
                    }
                    FetchOutcome::Failed(error) => {
                        loading.show_error(&error);
                        Err(error.into())
                    }
                    FetchOutcome::Stale => {
                        warn!("fetch for '{}' was superseded", ticket.root);
                        Ok(self.reconciler.plan())
                    }
                }
            }
        }
    }

    /// Request `id` and show it, fetching through `source` on a cache miss.
    pub fn reroot_with<S, L>(
        &mut self,
        source: &mut S,
        loading: &mut L,
        id: PersonId,
        now_ms: f64,
    ) -> Result<RenderPlan, ViewError>
    where
        S: FamilyTreeSource + ?Sized,
        L: LoadingIndicator + ?Sized,
    {
        let step = self.request_reroot(id)?;
        self.drive(step, source, loading, now_ms)
    }

    /// The person drawn under a screen point.
    pub fn hit_test(&self, screen_x: f64, screen_y: f64, now_ms: f64) -> Option<PersonId> {
        let (gx, gy) = self
            .controller
            .transform_at(now_ms)
            .invert(screen_x, screen_y);
        self.spatial
            .hit(
                gx as f32,
                gy as f32,
                self.config.hourglass.node_width / 2.0,
                self.config.hourglass.node_height / 2.0,
            )
            .cloned()
    }

    /// Hit test and hand the person to the current click handler.
    pub fn click(&self, screen_x: f64, screen_y: f64, now_ms: f64) -> Option<PersonId> {
        let id = self.hit_test(screen_x, screen_y, now_ms)?;
        self.on_click.call(&id);
        Some(id)
    }

    pub fn transform(&self, now_ms: f64) -> ViewTransform {
        self.controller.transform_at(now_ms)
    }

    pub fn zoom_by(&mut self, factor: f64, cx: f64, cy: f64, now_ms: f64) -> ViewTransform {
        self.controller.zoom_by(factor, cx, cy, now_ms)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64, now_ms: f64) -> ViewTransform {
        self.controller.pan_by(dx, dy, now_ms)
    }

    /// Sampled elements at `now_ms`, finished exits dropped.
    pub fn frame(&mut self, now_ms: f64) -> Frame {
        self.reconciler.prune(now_ms);
        self.reconciler.frame(now_ms)
    }

    /// Standalone SVG of the frame at `now_ms`.
    pub fn render_svg(&mut self, now_ms: f64) -> String {
        let frame = self.frame(now_ms);
        let (width, height) = self.controller.viewport();
        render_frame(
            &frame,
            &self.controller.transform_at(now_ms),
            (width as f32, height as f32),
            &self.config.hourglass,
        )
    }
}

impl Default for FamilyTreeView {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::{CompleteGraph, MarriageRelation, ParentRelation, Person};
    use crate::render::{ElementKey, Phase};
    use crate::source::LocalSource;

    fn source() -> LocalSource {
        LocalSource::new(CompleteGraph {
            persons: vec![
                Person::new("f").with_gender("m"),
                Person::new("m").with_gender("f"),
                Person::new("r"),
                Person::new("w"),
                Person::new("c"),
            ],
            marriages: vec![
                MarriageRelation::new("f", "m"),
                MarriageRelation::new("r", "w"),
            ],
            parents: vec![
                ParentRelation::new("f", "r"),
                ParentRelation::new("m", "r"),
                ParentRelation::new("r", "c"),
            ],
            siblings: vec![],
        })
    }

    #[derive(Default)]
    struct Spinner {
        events: Vec<String>,
    }

    impl LoadingIndicator for Spinner {
        fn show_loading(&mut self) {
            self.events.push("show".to_owned());
        }

        fn hide_loading(&mut self) {
            self.events.push("hide".to_owned());
        }

        fn show_error(&mut self, error: &FetchError) {
            self.events.push(format!("error: {error}"));
        }
    }

    struct Offline;

    impl FamilyTreeSource for Offline {
        fn fetch_family_tree(
            &mut self,
            _root: &PersonId,
            _distance: Option<u32>,
        ) -> Result<FamilyTreeGraph, FetchError> {
            Err(FetchError::Network("offline".to_owned()))
        }
    }

    fn mounted(source: &mut LocalSource, spinner: &mut Spinner) -> FamilyTreeView {
        let mut view = FamilyTreeView::default();
        let step = view.mount("r".into(), 800.0, 600.0);
        view.drive(step, source, spinner, 0.0).unwrap();
        view
    }

    #[test]
    fn test_requires_mount() {
        let mut view = FamilyTreeView::default();
        assert_eq!(
            view.request_reroot("r".into()).err(),
            Some(ViewError::NotMounted)
        );
        assert_eq!(view.show(&"r".into(), 0.0).err(), Some(ViewError::NotMounted));
    }

    #[test]
    fn test_mount_shows_centered_tree() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let view = mounted(&mut source, &mut spinner);

        assert_eq!(spinner.events, ["show", "hide"]);
        assert_eq!(view.transform(0.0), ViewTransform::centered(800.0, 600.0, 1.0));
        assert_eq!(view.scene().map(|s| s.root_id().as_str()), Some("r"));
    }

    #[test]
    fn test_cached_reroot_does_not_fetch() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let mut view = mounted(&mut source, &mut spinner);

        view.reroot_with(&mut source, &mut spinner, "c".into(), 1000.0)
            .unwrap();
        assert_eq!(source.fetch_count(), 2);

        // Back to a root that is already cached
        let plan = view
            .reroot_with(&mut source, &mut spinner, "r".into(), 2000.0)
            .unwrap();
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(spinner.events, ["show", "hide", "show", "hide"]);
        let root = plan
            .nodes
            .iter()
            .find(|element| element.key == ElementKey::Node("r".into()))
            .map(|element| element.phase);
        assert_eq!(root, Some(Phase::Update));
    }

    #[test]
    fn test_failed_fetch_keeps_scene_and_spinner() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let mut view = mounted(&mut source, &mut spinner);

        let err = view
            .reroot_with(&mut Offline, &mut spinner, "c".into(), 1000.0)
            .unwrap_err();
        assert!(matches!(err, ViewError::Fetch(FetchError::Network(_))));
        assert_eq!(
            spinner.events,
            ["show", "hide", "show", "error: Network error: offline"]
        );
        assert_eq!(view.scene().map(|s| s.root_id().as_str()), Some("r"));
    }

    #[test]
    fn test_unbuildable_root_keeps_current_tree() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let mut view = mounted(&mut source, &mut spinner);

        // Root record without a matching Persons entry
        let broken =
            FamilyTreeGraph::from_json(r#"{ "Root": { "Id": "x" }, "Persons": {} }"#).unwrap();
        let id = view.load_graph(broken);

        assert_eq!(view.show(&id, 1000.0).err(), Some(ViewError::UnknownRoot(id)));
        assert_eq!(view.scene().map(|s| s.root_id().as_str()), Some("r"));
        assert_eq!(
            view.controller().current_root().map(PersonId::as_str),
            Some("r")
        );
    }

    #[test]
    fn test_click_dispatches_to_current_handler() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let view = mounted(&mut source, &mut spinner);

        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        view.set_click_handler(move |id| sink.borrow_mut().push(id.clone()));

        // Child sits one generation below the centred root
        assert_eq!(view.click(400.0, 500.0, 0.0), Some("c".into()));
        assert_eq!(view.click(400.0, 400.0, 0.0), None);

        // A handler bound later replaces the first one
        let replaced = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&replaced);
        view.set_click_handler(move |_| *counter.borrow_mut() += 1);
        assert_eq!(view.click(400.0, 300.0, 0.0), Some("r".into()));

        assert_eq!(*clicked.borrow(), [PersonId::new("c")]);
        assert_eq!(*replaced.borrow(), 1);
    }

    #[test]
    fn test_reroot_starts_from_clicked_screen_position() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let mut view = mounted(&mut source, &mut spinner);

        let clicked = view.hit_test(400.0, 500.0, 1000.0).unwrap();
        view.reroot_with(&mut source, &mut spinner, clicked.clone(), 1000.0)
            .unwrap();

        let screen_position = |view: &mut FamilyTreeView, now: f64| {
            let frame = view.frame(now);
            let element = frame.node(&clicked).unwrap();
            let crate::render::Visual::Node { x, y, .. } = element.visual else {
                panic!("node element without node visual");
            };
            view.transform(now).apply(f64::from(x), f64::from(y))
        };

        assert_eq!(screen_position(&mut view, 1000.0), (400.0, 500.0));
        assert_eq!(screen_position(&mut view, 1500.0), (400.0, 300.0));
    }

    #[test]
    fn test_render_svg() {
        let mut source = source();
        let mut spinner = Spinner::default();
        let mut view = mounted(&mut source, &mut spinner);

        let svg = view.render_svg(500.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-id="c""#));
        assert!(svg.contains(r#"translate(400,300) scale(1)"#));
    }
}
