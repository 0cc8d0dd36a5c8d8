//! Re-root orchestration: graph cache, fetch tokens and the view transform.
//!
//! Fetching is modelled without IO. [`ReRootController::request_root`] either
//! answers from the cache or hands out a [`FetchTicket`]; the host performs
//! the fetch and reports back through [`ReRootController::complete_fetch`].
//! Only the most recent ticket is honoured.

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;

use crate::config::ViewConfig;
use crate::error::{FetchError, ViewError};
use crate::layout::Bounds;
use crate::model::{FamilyTreeGraph, PersonId};
use crate::render::Timing;

/// Pan/zoom transform: screen = graph * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// Graph origin in the middle of a `width` by `height` viewport.
    pub fn centered(width: f64, height: f64, k: f64) -> Self {
        Self::new(width / 2.0, height / 2.0, k)
    }

    pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
        (gx * self.k + self.x, gy * self.k + self.y)
    }

    pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    fn interpolate(&self, to: &ViewTransform, t: f64) -> ViewTransform {
        ViewTransform {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }

    /// Shift the transform so that the viewport stays inside `extent`.
    ///
    /// If the extent is smaller than the viewport along an axis, the extent
    /// is centred on that axis instead.
    pub fn constrain(&self, viewport: (f64, f64), extent: &Bounds) -> ViewTransform {
        let (width, height) = viewport;
        let (left, top) = self.invert(0.0, 0.0);
        let (right, bottom) = self.invert(width, height);

        let dx0 = left - f64::from(extent.min[0]);
        let dx1 = right - f64::from(extent.max[0]);
        let dy0 = top - f64::from(extent.min[1]);
        let dy1 = bottom - f64::from(extent.max[1]);

        let correct = |d0: f64, d1: f64| {
            if d1 > d0 {
                (d0 + d1) / 2.0
            } else {
                let toward_min = d0.min(0.0);
                if toward_min != 0.0 {
                    toward_min
                } else {
                    d1.max(0.0)
                }
            }
        };

        ViewTransform {
            x: self.x + self.k * correct(dx0, dx1),
            y: self.y + self.k * correct(dy0, dy1),
            k: self.k,
        }
    }
}

/// Where the fetch pipeline stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum LoadStatus {
    Idle,
    Loading,
    /// The last fetch failed; the previous graph stays on screen.
    Failed(String),
}

/// A fetch the host has to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTicket {
    pub token: u64,
    pub root: PersonId,
    pub distance: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RerootStep {
    /// The graph is cached and can be shown right away.
    Ready(PersonId),
    Fetch(FetchTicket),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Ready(PersonId),
    /// The response belongs to a superseded request and was discarded.
    Stale,
    Failed(FetchError),
}

#[derive(Debug, Clone)]
struct PendingFetch {
    token: u64,
    root: PersonId,
}

#[derive(Debug, Clone, Copy)]
struct TransformTransition {
    from: ViewTransform,
    to: ViewTransform,
    timing: Timing,
}

/// Cache, request tokens and pan/zoom state of one view.
pub struct ReRootController {
    config: ViewConfig,
    cache: HashMap<PersonId, FamilyTreeGraph>,
    current_root: Option<PersonId>,
    pending: Option<PendingFetch>,
    next_token: u64,
    status: LoadStatus,
    transform: TransformTransition,
    viewport: (f64, f64),
    extent: Option<Bounds>,
}

impl ReRootController {
    pub fn new(config: ViewConfig) -> Self {
        let initial = ViewTransform::IDENTITY;
        Self {
            config,
            cache: HashMap::new(),
            current_root: None,
            pending: None,
            next_token: 1,
            status: LoadStatus::Idle,
            transform: TransformTransition {
                from: initial,
                to: initial,
                timing: Timing::new(0.0, 0.0),
            },
            viewport: (0.0, 0.0),
            extent: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn current_root(&self) -> Option<&PersonId> {
        self.current_root.as_ref()
    }

    pub fn current_graph(&self) -> Option<&FamilyTreeGraph> {
        self.current_root.as_ref().and_then(|id| self.cache.get(id))
    }

    pub fn is_cached(&self, id: &PersonId) -> bool {
        self.cache.contains_key(id)
    }

    pub fn cached(&self, id: &PersonId) -> Option<&FamilyTreeGraph> {
        self.cache.get(id)
    }

    /// Store a graph under its root id, replacing an older copy.
    pub fn insert(&mut self, graph: FamilyTreeGraph) -> PersonId {
        let id = graph.root_id().clone();
        self.cache.insert(id.clone(), graph);
        id
    }

    /// Ask for `id` to become the root.
    ///
    /// A cached graph is ready immediately and supersedes any pending fetch.
    /// Otherwise a new ticket is issued and older tickets become stale.
    pub fn request_root(&mut self, id: PersonId) -> RerootStep {
        if self.cache.contains_key(&id) {
            if self.pending.take().is_some() {
                self.status = LoadStatus::Idle;
            }
            return RerootStep::Ready(id);
        }

        let token = self.next_token;
        self.next_token += 1;
        if let Some(previous) = self.pending.replace(PendingFetch {
            token,
            root: id.clone(),
        }) {
            info!(
                "fetch for '{}' superseded by '{}'",
                previous.root, id
            );
        }
        self.status = LoadStatus::Loading;

        RerootStep::Fetch(FetchTicket {
            token,
            root: id,
            distance: self.config.fetch_distance,
        })
    }

    /// Report the result of the fetch issued with `token`.
    pub fn complete_fetch(
        &mut self,
        token: u64,
        result: Result<FamilyTreeGraph, FetchError>,
    ) -> FetchOutcome {
        let Some(pending) = self.pending.as_ref().filter(|p| p.token == token) else {
            warn!("discarding response for stale fetch token {token}");
            return FetchOutcome::Stale;
        };
        let requested = pending.root.clone();
        self.pending = None;

        match result {
            Ok(graph) => {
                if graph.root_id() != &requested {
                    warn!(
                        "requested '{}' but received graph rooted at '{}'",
                        requested,
                        graph.root_id()
                    );
                }
                self.status = LoadStatus::Idle;
                FetchOutcome::Ready(self.insert(graph))
            }
            Err(error) => {
                warn!("fetch for '{requested}' failed: {error}");
                self.status = LoadStatus::Failed(error.to_string());
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Make the cached graph for `id` the current one.
    pub fn activate(&mut self, id: &PersonId) -> Result<&FamilyTreeGraph, ViewError> {
        if !self.cache.contains_key(id) {
            return Err(ViewError::UnknownRoot(id.clone()));
        }
        if self.current_root.as_ref() != Some(id) {
            info!(
                "re-rooting from {} to '{id}'",
                self.current_root
                    .as_ref()
                    .map_or_else(|| "nothing".to_owned(), |old| format!("'{old}'"))
            );
        }
        self.current_root = Some(id.clone());
        self.cache
            .get(id)
            .ok_or_else(|| ViewError::UnknownRoot(id.clone()))
    }

    // ========================================================================
    // View transform
    // ========================================================================

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    /// Pan extent of the scene currently shown.
    pub fn set_extent(&mut self, extent: Bounds) {
        self.extent = Some(extent);
    }

    /// Transform at `now_ms`, following any running transition.
    pub fn transform_at(&self, now_ms: f64) -> ViewTransform {
        let t = f64::from(self.transform.timing.eased(now_ms));
        self.transform.from.interpolate(&self.transform.to, t)
    }

    /// Transform that puts the graph origin (the root) in the middle of the
    /// viewport at the current zoom level.
    pub fn centered_transform(&self, now_ms: f64) -> ViewTransform {
        let (width, height) = self.viewport;
        let k = self.transform_at(now_ms).k;
        self.constrained(ViewTransform::centered(width, height, k))
    }

    /// Move to the centred transform, animated from wherever the view is now.
    ///
    /// Nodes that survive a re-root also animate from their current screen
    /// positions, so the clicked node starts exactly where it was clicked.
    pub fn recenter(&mut self, now_ms: f64, animate: bool) {
        let from = self.transform_at(now_ms);
        let to = self.centered_transform(now_ms);
        let duration = if animate { self.config.transition_ms } else { 0.0 };
        self.transform = TransformTransition {
            from,
            to,
            timing: Timing::new(now_ms, duration),
        };
    }

    /// Jump to `transform`, cancelling any transition.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = TransformTransition {
            from: transform,
            to: transform,
            timing: Timing::new(0.0, 0.0),
        };
    }

    /// Zoom by `factor` around the screen point `(cx, cy)`.
    pub fn zoom_by(&mut self, factor: f64, cx: f64, cy: f64, now_ms: f64) -> ViewTransform {
        let current = self.transform_at(now_ms);
        let k = (current.k * factor).clamp(
            f64::from(self.config.min_scale),
            f64::from(self.config.max_scale),
        );
        let (gx, gy) = current.invert(cx, cy);
        let zoomed = ViewTransform::new(cx - gx * k, cy - gy * k, k);
        let constrained = self.constrained(zoomed);
        self.set_transform(constrained);
        constrained
    }

    /// Pan by a screen space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64, now_ms: f64) -> ViewTransform {
        let current = self.transform_at(now_ms);
        let panned = ViewTransform::new(current.x + dx, current.y + dy, current.k);
        let constrained = self.constrained(panned);
        self.set_transform(constrained);
        constrained
    }

    fn constrained(&self, transform: ViewTransform) -> ViewTransform {
        match &self.extent {
            Some(extent) => transform.constrain(self.viewport, extent),
            None => transform,
        }
    }
}
