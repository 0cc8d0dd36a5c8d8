//! Visual attributes of nodes and links.

use serde::Serialize;

use crate::config::HourglassConfig;
use crate::layout::PositionedNode;
use crate::links::Link;
use crate::model::{DeathState, Gender, Person};
use crate::tree::NodeRole;

pub const LINK_STROKE: &str = "#ccc";
pub const LINK_STROKE_WIDTH: f32 = 2.0;
pub const NODE_STROKE_WIDTH: f32 = 8.0;
pub const NODE_CORNER_RADIUS: f32 = 10.0;

/// Four polyline points of a link.
pub type LinkPoints = [[f32; 2]; 4];

pub fn node_class(role: NodeRole) -> String {
    format!("node node-{role}")
}

pub fn link_class(link: &Link) -> String {
    if link.is_spouse() {
        "link link-spouse".to_owned()
    } else {
        format!("link link-{}", link.target.role)
    }
}

pub fn gender_fill(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "#5A7FBF",
        Gender::Female => "#D94F70",
        Gender::Unknown => "#E0B75C",
    }
}

pub fn death_stroke(state: DeathState) -> &'static str {
    match state {
        DeathState::Alive => "#66BB6A",
        DeathState::Dead => "#6E4B3A",
        DeathState::Unknown => "#A0A0A0",
    }
}

/// Draw layer of a node within the node pass.
pub fn node_layer(role: NodeRole) -> u8 {
    match role {
        NodeRole::Root | NodeRole::Ancestor | NodeRole::Descendant | NodeRole::DescendantSpouse => 0,
        NodeRole::Sibling => 1,
        NodeRole::RootSpouse => 2,
    }
}

/// Draw layer of a link within the link pass.
pub fn link_layer(link: &Link) -> u8 {
    if link.is_spouse() {
        return 2;
    }
    match link.target.role {
        NodeRole::Sibling => 1,
        NodeRole::Root
        | NodeRole::Ancestor
        | NodeRole::Descendant
        | NodeRole::RootSpouse
        | NodeRole::DescendantSpouse => 0,
    }
}

/// Polyline of a link in graph space.
///
/// Tree links leave the source vertically, run horizontally half a
/// generation before the target and enter the target vertically. Spouse links
/// dip below both partners by one offset step per node between them, so
/// parallel marriages stay apart.
pub fn link_points(link: &Link, config: &HourglassConfig) -> LinkPoints {
    let (sx, sy) = (link.source.x, link.source.y);
    let (tx, ty) = (link.target.x, link.target.y);

    if let Some(spouse) = link.spouse_data() {
        let offset = spouse.nodes_in_between.unwrap_or(0) as f32 * config.spouse_line_offset;
        return [[sx, sy], [sx, sy + offset], [tx, ty + offset], [tx, ty]];
    }

    let direction = match link.target.role {
        NodeRole::Ancestor => -1.0,
        NodeRole::Root
        | NodeRole::Descendant
        | NodeRole::Sibling
        | NodeRole::RootSpouse
        | NodeRole::DescendantSpouse => 1.0,
    };
    let ty_half = ty - config.layout_height / 2.0 * direction;
    [[sx, sy], [sx, ty_half], [tx, ty_half], [tx, ty]]
}

/// SVG `points` attribute form.
pub fn points_attr(points: &LinkPoints) -> String {
    points
        .iter()
        .map(|[x, y]| format!("{x},{y}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text shown inside a node box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabels {
    pub name: String,
    pub birth_date: String,
    /// Only set for persons known to be dead.
    pub death_date: Option<String>,
}

impl NodeLabels {
    pub fn of(person: &Person) -> Self {
        Self {
            name: person.display_name(),
            birth_date: person.birth_date().to_dotted(),
            death_date: match person.death_state() {
                DeathState::Dead => Some(person.death_date().to_dotted()),
                DeathState::Alive | DeathState::Unknown => None,
            },
        }
    }
}

/// Static attributes of a node element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub class: String,
    pub fill: &'static str,
    pub stroke: &'static str,
    /// `alive`, `dead` or `unknown`.
    pub marker: &'static str,
    pub labels: NodeLabels,
}

impl NodeStyle {
    pub fn of(node: &PositionedNode) -> Self {
        let death = node.person.death_state();
        Self {
            class: node_class(node.role),
            fill: gender_fill(node.person.gender()),
            stroke: death_stroke(death),
            marker: death.as_str(),
            labels: NodeLabels::of(&node.person),
        }
    }
}

/// Static attributes of a link element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStyle {
    pub class: String,
}

impl LinkStyle {
    pub fn of(link: &Link) -> Self {
        Self {
            class: link_class(link),
        }
    }
}
