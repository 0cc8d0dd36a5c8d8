//! Keyed enter/update/exit reconciliation between successive scenes.
//!
//! Every element is identified by an [`ElementKey`]. On each rebuild the
//! reconciler samples where every known element currently is, then starts a
//! new transition per key:
//!
//! - **enter**: new key, fades in at its target position;
//! - **update**: known key, moves from its sampled state to the target;
//! - **exit**: vanished key, fades out in place and is dropped afterwards.
//!
//! Links are drawn before nodes. Inside each pass elements are stably sorted
//! by layer so sibling and spouse indicators sit above plain tree lines.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use super::style::{link_layer, link_points, node_layer, LinkPoints, LinkStyle, NodeStyle};
use super::transition::{lerp, Timing};
use crate::config::{HourglassConfig, TRANSITION_DURATION};
use crate::model::PersonId;
use crate::scene::HourglassScene;

/// Stable identity of a rendered element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ElementKey {
    Node(PersonId),
    /// Direction independent endpoint pair, see [`crate::links::link_key`].
    Link(String),
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Node(id) => write!(f, "node:{id}"),
            ElementKey::Link(key) => write!(f, "link:{key}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

/// Animated attributes of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Visual {
    Node { x: f32, y: f32, opacity: f32 },
    Link { points: LinkPoints, opacity: f32 },
}

impl Visual {
    pub fn opacity(&self) -> f32 {
        match *self {
            Visual::Node { opacity, .. } | Visual::Link { opacity, .. } => opacity,
        }
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        match self {
            Visual::Node { x, y, .. } => Visual::Node { x, y, opacity },
            Visual::Link { points, .. } => Visual::Link { points, opacity },
        }
    }

    /// Interpolate towards `to`. Mismatched kinds snap to `to`.
    pub fn interpolate(&self, to: &Visual, t: f32) -> Visual {
        match (*self, *to) {
            (
                Visual::Node { x, y, opacity },
                Visual::Node {
                    x: tx,
                    y: ty,
                    opacity: to_opacity,
                },
            ) => Visual::Node {
                x: lerp(x, tx, t),
                y: lerp(y, ty, t),
                opacity: lerp(opacity, to_opacity, t),
            },
            (
                Visual::Link { points, opacity },
                Visual::Link {
                    points: to_points,
                    opacity: to_opacity,
                },
            ) => {
                let mut mixed = points;
                for (point, target) in mixed.iter_mut().zip(to_points) {
                    point[0] = lerp(point[0], target[0], t);
                    point[1] = lerp(point[1], target[1], t);
                }
                Visual::Link {
                    points: mixed,
                    opacity: lerp(opacity, to_opacity, t),
                }
            }
            _ => *to,
        }
    }
}

/// Static attributes carried along with an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementStyle {
    Node(NodeStyle),
    Link(LinkStyle),
}

/// One element with its current transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub key: ElementKey,
    pub phase: Phase,
    pub layer: u8,
    pub from: Visual,
    pub to: Visual,
    pub timing: Timing,
    pub style: ElementStyle,
}

impl ElementState {
    /// Interpolated visual at `now_ms`.
    pub fn sample(&self, now_ms: f64) -> Visual {
        self.from.interpolate(&self.to, self.timing.eased(now_ms))
    }

    /// An exit whose fade has completed.
    pub fn is_gone(&self, now_ms: f64) -> bool {
        self.phase == Phase::Exit && self.timing.is_finished(now_ms)
    }
}

/// An element as it should be drawn at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameElement {
    pub key: ElementKey,
    pub phase: Phase,
    pub visual: Visual,
    pub style: ElementStyle,
}

/// Everything to draw at one instant: links first, then nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub links: Vec<FrameElement>,
    pub nodes: Vec<FrameElement>,
}

impl Frame {
    pub fn node(&self, id: &PersonId) -> Option<&FrameElement> {
        self.nodes
            .iter()
            .find(|element| matches!(&element.key, ElementKey::Node(node) if node == id))
    }

    pub fn link(&self, key: &str) -> Option<&FrameElement> {
        self.links
            .iter()
            .find(|element| matches!(&element.key, ElementKey::Link(link) if link == key))
    }
}

/// Result of one reconcile: the ordered transitions of both passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderPlan {
    pub links: Vec<ElementState>,
    pub nodes: Vec<ElementState>,
}

impl RenderPlan {
    /// Interpolate every element at `now_ms`. Finished exits are left out.
    pub fn sample(&self, now_ms: f64) -> Frame {
        let sample_pass = |pass: &[ElementState]| -> Vec<FrameElement> {
            pass.iter()
                .filter(|element| !element.is_gone(now_ms))
                .map(|element| FrameElement {
                    key: element.key.clone(),
                    phase: element.phase,
                    visual: element.sample(now_ms),
                    style: element.style.clone(),
                })
                .collect()
        };
        Frame {
            links: sample_pass(&self.links),
            nodes: sample_pass(&self.nodes),
        }
    }

    /// When the last transition of this plan ends.
    pub fn end_ms(&self) -> f64 {
        self.links
            .iter()
            .chain(&self.nodes)
            .map(|element| element.timing.end_ms())
            .fold(0.0, f64::max)
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.links
            .iter()
            .chain(&self.nodes)
            .filter(|element| element.phase == phase)
            .count()
    }
}

/// Keyed visual state of everything on screen.
pub struct Reconciler {
    elements: HashMap<ElementKey, ElementState>,
    link_order: Vec<ElementKey>,
    node_order: Vec<ElementKey>,
    transition_ms: f64,
    hourglass: HourglassConfig,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(HourglassConfig::default(), TRANSITION_DURATION)
    }
}

impl Reconciler {
    pub fn new(hourglass: HourglassConfig, transition_ms: f64) -> Self {
        Self {
            elements: HashMap::new(),
            link_order: Vec::new(),
            node_order: Vec::new(),
            transition_ms,
            hourglass,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, key: &ElementKey) -> Option<&ElementState> {
        self.elements.get(key)
    }

    /// Diff `scene` against the current state and start the transitions.
    pub fn reconcile(&mut self, scene: &HourglassScene, now_ms: f64) -> RenderPlan {
        let timing = Timing::new(now_ms, self.transition_ms);

        // Where everything is right now, before retargeting
        let current: HashMap<ElementKey, Visual> = self
            .elements
            .iter()
            .filter(|(_, element)| !element.is_gone(now_ms))
            .map(|(key, element)| (key.clone(), element.sample(now_ms)))
            .collect();

        let mut previous = std::mem::take(&mut self.elements);
        let previous_links = std::mem::take(&mut self.link_order);
        let previous_nodes = std::mem::take(&mut self.node_order);
        let mut seen: HashSet<ElementKey> = HashSet::new();

        for link in &scene.links {
            let key = ElementKey::Link(link.key());
            if !seen.insert(key.clone()) {
                warn!("duplicate link '{}' in scene, keeping the first", link.key());
                continue;
            }
            let target = Visual::Link {
                points: link_points(link, &self.hourglass),
                opacity: 1.0,
            };
            let state = Self::retarget(
                key.clone(),
                current.get(&key).copied(),
                target,
                timing,
                link_layer(link),
                ElementStyle::Link(LinkStyle::of(link)),
            );
            self.elements.insert(key.clone(), state);
            self.link_order.push(key);
        }

        for node in &scene.nodes {
            let key = ElementKey::Node(node.id().clone());
            if !seen.insert(key.clone()) {
                debug!(
                    "'{}' drawn again as {}, keeping the first occurrence",
                    node.id(),
                    node.role
                );
                continue;
            }
            let target = Visual::Node {
                x: node.x,
                y: node.y,
                opacity: 1.0,
            };
            let state = Self::retarget(
                key.clone(),
                current.get(&key).copied(),
                target,
                timing,
                node_layer(node.role),
                ElementStyle::Node(NodeStyle::of(node)),
            );
            self.elements.insert(key.clone(), state);
            self.node_order.push(key);
        }

        // Whatever is left in `previous` and not re-used fades out
        let mut fade_out = |order: Vec<ElementKey>, into: &mut Vec<ElementKey>| {
            for key in order {
                if seen.contains(&key) {
                    continue;
                }
                let Some(mut element) = previous.remove(&key) else {
                    continue;
                };
                if element.is_gone(now_ms) {
                    continue;
                }
                if element.phase != Phase::Exit {
                    let from = current.get(&key).copied().unwrap_or(element.to);
                    element.phase = Phase::Exit;
                    element.from = from;
                    element.to = from.with_opacity(0.0);
                    element.timing = timing;
                }
                self.elements.insert(key.clone(), element);
                into.push(key);
            }
        };
        let mut exiting_links = Vec::new();
        let mut exiting_nodes = Vec::new();
        fade_out(previous_links, &mut exiting_links);
        fade_out(previous_nodes, &mut exiting_nodes);
        self.link_order.extend(exiting_links);
        self.node_order.extend(exiting_nodes);

        let plan = self.plan();
        debug!(
            "reconciled '{}': {} enter, {} update, {} exit",
            scene.root_id(),
            plan.count(Phase::Enter),
            plan.count(Phase::Update),
            plan.count(Phase::Exit)
        );
        plan
    }

    fn retarget(
        key: ElementKey,
        current: Option<Visual>,
        target: Visual,
        timing: Timing,
        layer: u8,
        style: ElementStyle,
    ) -> ElementState {
        let (phase, from) = match current {
            Some(visual) => (Phase::Update, visual),
            None => (Phase::Enter, target.with_opacity(0.0)),
        };
        ElementState {
            key,
            phase,
            layer,
            from,
            to: target,
            timing,
            style,
        }
    }

    /// The current transitions in draw order.
    pub fn plan(&self) -> RenderPlan {
        let pass = |order: &[ElementKey]| -> Vec<ElementState> {
            let mut elements: Vec<ElementState> = order
                .iter()
                .filter_map(|key| self.elements.get(key).cloned())
                .collect();
            elements.sort_by_key(|element| element.layer);
            elements
        };
        RenderPlan {
            links: pass(&self.link_order),
            nodes: pass(&self.node_order),
        }
    }

    /// Drop exits that have finished fading out.
    pub fn prune(&mut self, now_ms: f64) {
        self.elements.retain(|_, element| !element.is_gone(now_ms));
        let elements = &self.elements;
        self.link_order.retain(|key| elements.contains_key(key));
        self.node_order.retain(|key| elements.contains_key(key));
    }

    /// Sampled frame of the current state.
    pub fn frame(&self, now_ms: f64) -> Frame {
        self.plan().sample(now_ms)
    }

    /// Target positions of all nodes that are not fading out.
    pub fn node_targets(&self) -> impl Iterator<Item = (&PersonId, f32, f32)> + '_ {
        self.node_order.iter().filter_map(|key| {
            let element = self.elements.get(key)?;
            match (&element.key, element.phase, element.to) {
                (ElementKey::Node(id), Phase::Enter | Phase::Update, Visual::Node { x, y, .. }) => {
                    Some((id, x, y))
                }
                _ => None,
            }
        })
    }
}
