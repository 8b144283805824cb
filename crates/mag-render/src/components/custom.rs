//! Free-form layout: every element is absolutely positioned.
//!
//! Element boxes are percentages of the content box (`x`, `y`, `width`,
//! `height`), matching how the editor's canvas stores them. Elements are
//! painted in array order unless a `zIndex` says otherwise.

use super::content::{LayoutContext, PageContent};
use crate::scene::{Edges, ImageFit, Length, Node, TextAlign, TextStyle};

pub fn custom(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let mut elements: Vec<(i64, Node)> = content
        .list("elements")
        .into_iter()
        .filter_map(|element| {
            let node = element_node(&element, ctx)?;
            let z = element.number("zIndex").unwrap_or(0.0) as i64;
            Some((z, node))
        })
        .collect();
    // Stable, so equal z keeps document order
    elements.sort_by_key(|(z, _)| *z);

    let mut page = Node::column().fill();
    if let Some(background) = content.image("backgroundImage") {
        page = page.child(
            Node::image(background.src, background.fit)
                .frame_offset(background.frame_offset_ms)
                .absolute(
                    Length::Percent(0.0),
                    Length::Percent(0.0),
                    Length::Percent(100.0),
                    Length::Percent(100.0),
                ),
        );
    }
    page.children(elements.into_iter().map(|(_, node)| node))
}

fn element_node(element: &PageContent<'_>, ctx: &LayoutContext) -> Option<Node> {
    let percent = |key: &str, fallback: f64| {
        Length::Percent(element.number(key).unwrap_or(fallback).clamp(-100.0, 200.0) as f32)
    };
    let (x, y) = (percent("x", 0.0), percent("y", 0.0));
    let (width, height) = (percent("width", 20.0), percent("height", 10.0));

    let mut node = match element.text("type").unwrap_or("text") {
        "text" | "heading" => {
            let scale = if element.text("type") == Some("heading") { 2.0 } else { 1.0 };
            let size = element
                .number("fontSize")
                .map(|s| s as f32)
                .unwrap_or_else(|| ctx.size(scale));
            let align = match element.text("align") {
                Some("center") => TextAlign::Center,
                Some("right") => TextAlign::Right,
                _ => TextAlign::Left,
            };
            let color = element.color("color").unwrap_or(ctx.theme.text);
            let mut style = TextStyle::new(size, color).align(align);
            if let Some(font) = element.text("fontFamily") {
                style = style.font(font);
            }
            Node::text(element.text("content").unwrap_or_default(), style)
        }
        "image" | "video" => {
            let image = element.image_any(&["src", "url", "image"])?;
            let fit = element.text("fit").map(ImageFit::parse).unwrap_or(image.fit);
            Node::image(image.src, fit).frame_offset(
                element
                    .number("frameOffsetMs")
                    .map(|v| v.max(0.0) as u64)
                    .or(image.frame_offset_ms),
            )
        }
        "shape" | "box" => Node::rect(element.color("color").unwrap_or(ctx.theme.accent)),
        other => {
            log::debug!("Skipping custom element of unknown type '{other}'");
            return None;
        }
    };

    if let Some(background) = element.color("backgroundColor") {
        node = node.background(background);
    }
    if let Some(border) = element.color("borderColor") {
        node = node.border(element.number("borderWidth").unwrap_or(1.0) as f32, border);
    }
    if let Some(padding) = element.number("padding") {
        node = node.padding(Edges::uniform(padding as f32));
    }
    if let Some(opacity) = element.number("opacity") {
        node = node.opacity(opacity as f32);
    }
    if let Some(target) = element.page_number("linkToPage") {
        node = node.child(Node::hotspot(target));
    }
    Some(node.absolute(x, y, width, height))
}
