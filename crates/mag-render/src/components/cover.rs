//! Full-page statement layouts: covers, dividers and ads

use super::content::{LayoutContext, PageContent};
use crate::scene::{Align, Edges, Justify, Node, Rgba, Size};

pub fn cover(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let masthead = content.text_any(&["magazineName", "masthead"]);
    let title = content.text_or("title", "Untitled issue");
    let issue_line = [content.text("issueNumber"), content.text("date")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("  ·  ");

    let mut page = Node::column().fill().gap(ctx.size(1.0));
    if let Some(masthead) = masthead {
        page = page.child(ctx.centered(ctx.heading(masthead, 3.0)));
    }
    if !issue_line.is_empty() {
        page = page.child(ctx.centered(ctx.caption(&issue_line)));
    }

    page = match content.image_any(&["coverImage", "backgroundImage", "image"]) {
        Some(image) => page.child(ctx.image(&image)),
        None => page.child(Node::column().fill()),
    };

    page.child(ctx.heading(title, 2.6))
        .maybe_child(content.text("subtitle").map(|s| ctx.heading(s, 1.3)))
        .children(
            content
                .list("headlines")
                .iter()
                .filter_map(|h| h.text("title").or_else(|| h.raw().as_str()))
                .map(|h| ctx.kicker(h)),
        )
}

pub fn back_cover(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let mut page = Node::column()
        .fill()
        .justify(Justify::Center)
        .align(Align::Center)
        .gap(ctx.size(1.2));

    if let Some(image) = content.image_any(&["image", "logo"]) {
        page = page.child(
            Node::image(image.src, image.fit)
                .frame_offset(image.frame_offset_ms)
                .width(Size::Percent(40.0)),
        );
    }

    page.maybe_child(
        content
            .text_any(&["title", "message"])
            .map(|t| ctx.centered(ctx.heading(t, 2.0))),
    )
    .maybe_child(content.text("tagline").map(|t| ctx.centered(ctx.body(t))))
    .maybe_child(content.text("contact").map(|t| ctx.centered(ctx.caption(t))))
    .maybe_child(
        content
            .text_any(&["website", "url"])
            .map(|t| ctx.centered(ctx.kicker(t))),
    )
}

pub fn section_divider(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let band = content.color("backgroundColor").unwrap_or(ctx.theme.accent);
    let ink = if band.is_dark() {
        Rgba::WHITE
    } else {
        Rgba::rgb(17, 24, 39)
    };
    let mut title = ctx.heading(content.text_or("title", "Section"), 3.0);
    recolor(&mut title, ink);

    let mut page = Node::column()
        .fill()
        .background(band)
        .padding(Edges::uniform(ctx.size(3.0)))
        .justify(Justify::Center)
        .gap(ctx.size(1.0));

    if let Some(number) = content.text("sectionNumber") {
        let mut label = ctx.heading(number, 5.0);
        recolor(&mut label, ink.with_alpha(160));
        page = page.child(label);
    }
    page = page.child(title);
    if let Some(subtitle) = content.text("subtitle") {
        let mut sub = ctx.body(subtitle);
        recolor(&mut sub, ink);
        page = page.child(sub);
    }
    page
}

pub fn advertisement(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let image = content.image_any(&["image", "adImage"]);
    let mut page = Node::column().fill().gap(ctx.size(1.0));

    // Ads without copy are a single full-bleed creative
    if let Some(image) = &image {
        page = page.child(ctx.image(image));
    }
    let copy = Node::column()
        .gap(ctx.size(0.6))
        .align(Align::Center)
        .maybe_child(content.text("headline").map(|t| ctx.centered(ctx.heading(t, 2.0))))
        .maybe_child(content.text("body").map(|t| ctx.centered(ctx.body(t))))
        .maybe_child(content.text("callToAction").map(|cta| {
            let mut label = ctx.heading(cta, 1.1);
            recolor(&mut label, Rgba::WHITE);
            Node::row()
                .background(ctx.theme.accent)
                .padding(Edges::symmetric(ctx.size(0.5), ctx.size(1.2)))
                .child(label)
        }))
        .maybe_child(content.text("url").map(|t| ctx.caption(t)));

    if copy.children.is_empty() && image.is_some() {
        page
    } else {
        page.child(copy)
    }
}

fn recolor(node: &mut Node, color: Rgba) {
    if let crate::scene::NodeKind::Text(block) = &mut node.kind {
        block.style.color = color;
    }
}
