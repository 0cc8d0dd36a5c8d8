//! Static SVG output of a sampled frame.

use std::fmt::{self, Write};

use super::reconcile::{ElementKey, ElementStyle, Frame, FrameElement, Visual};
use super::style::{
    points_attr, LINK_STROKE, LINK_STROKE_WIDTH, NODE_CORNER_RADIUS, NODE_STROKE_WIDTH,
};
use crate::config::HourglassConfig;
use crate::controller::ViewTransform;

/// Render `frame` as a standalone SVG document of the given viewport size.
pub fn render_frame(
    frame: &Frame,
    transform: &ViewTransform,
    viewport: (f32, f32),
    config: &HourglassConfig,
) -> String {
    let mut svg = String::new();
    write_frame(&mut svg, frame, transform, viewport, config)
        .expect("writing SVG into a String cannot fail");
    svg
}

fn write_frame(
    svg: &mut String,
    frame: &Frame,
    transform: &ViewTransform,
    (width, height): (f32, f32),
    config: &HourglassConfig,
) -> fmt::Result {
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
    )?;
    writeln!(
        svg,
        r#"<g class="family-tree" transform="translate({},{}) scale({})">"#,
        transform.x, transform.y, transform.k
    )?;

    writeln!(svg, r#"<g class="link-container">"#)?;
    for link in &frame.links {
        write_link(svg, link)?;
    }
    writeln!(svg, "</g>")?;

    writeln!(svg, r#"<g class="node-container">"#)?;
    for node in &frame.nodes {
        write_node(svg, node, config)?;
    }
    writeln!(svg, "</g>")?;

    writeln!(svg, "</g>")?;
    writeln!(svg, "</svg>")
}

fn write_link(svg: &mut String, element: &FrameElement) -> fmt::Result {
    let (Visual::Link { points, opacity }, ElementStyle::Link(style)) =
        (&element.visual, &element.style)
    else {
        return Ok(());
    };
    writeln!(
        svg,
        r#"<polyline class="{}" points="{}" fill="none" stroke="{LINK_STROKE}" stroke-width="{LINK_STROKE_WIDTH}" opacity="{opacity}"/>"#,
        style.class,
        points_attr(points),
    )
}

fn write_node(svg: &mut String, element: &FrameElement, config: &HourglassConfig) -> fmt::Result {
    let (Visual::Node { x, y, opacity }, ElementStyle::Node(style), ElementKey::Node(id)) =
        (&element.visual, &element.style, &element.key)
    else {
        return Ok(());
    };
    let half_w = config.node_width / 2.0;
    let half_h = config.node_height / 2.0;

    writeln!(
        svg,
        r#"<g class="{} {}" data-id="{}" transform="translate({x},{y})" opacity="{opacity}">"#,
        style.class,
        style.marker,
        escape(id.as_str()),
    )?;
    writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{NODE_CORNER_RADIUS}" ry="{NODE_CORNER_RADIUS}" fill="{}" stroke="{}" stroke-width="{NODE_STROKE_WIDTH}"/>"#,
        -half_w, -half_h, config.node_width, config.node_height, style.fill, style.stroke,
    )?;
    writeln!(
        svg,
        r#"<text x="0" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        20.0 - half_h,
        escape(&style.labels.name),
    )?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="start">Birthdate: {}</text>"#,
        20.0 - half_w,
        45.0 - half_h,
        escape(&style.labels.birth_date),
    )?;
    if let Some(death_date) = &style.labels.death_date {
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="start">Deathdate: {}</text>"#,
            20.0 - half_w,
            65.0 - half_h,
            escape(death_date),
        )?;
    }
    writeln!(svg, "</g>")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
