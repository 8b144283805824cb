//! Image-led layouts

use super::content::{ImageRef, LayoutContext, PageContent};
use crate::scene::{Align, Edges, Justify, Node, Size};

pub fn full_image(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let image = content.image_any(&["image", "backgroundImage"]);
    let fit = content.text("fit").map(crate::scene::ImageFit::parse);

    Node::column()
        .fill()
        .gap(ctx.size(0.5))
        .maybe_child(image.map(|mut image| {
            if let Some(fit) = fit {
                image.fit = fit;
            }
            ctx.image(&image)
        }))
        .maybe_child(content.text("caption").map(|c| ctx.caption(c)))
        .maybe_child(content.text("credit").map(|c| ctx.caption(&format!("Photo: {c}"))))
}

fn text_column(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    Node::column()
        .width(Size::Fill(1.0))
        .justify(Justify::Center)
        .gap(ctx.size(0.8))
        .maybe_child(content.text("kicker").map(|k| ctx.kicker(k)))
        .maybe_child(content.text("title").map(|t| ctx.heading(t, 2.0)))
        .child(ctx.paragraphs(&content.paragraphs("body")))
}

fn image_column(image: Option<ImageRef>, ctx: &LayoutContext) -> Node {
    Node::column()
        .width(Size::Fill(1.0))
        .maybe_child(image.map(|image| ctx.image(&image)))
}

fn split(content: &PageContent<'_>, ctx: &LayoutContext, image_first: bool) -> Node {
    let image = image_column(content.image("image"), ctx);
    let text = text_column(content, ctx);
    let (first, second) = if image_first { (image, text) } else { (text, image) };
    Node::row().fill().gap(ctx.size(1.5)).child(first).child(second)
}

pub fn image_text(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    split(content, ctx, true)
}

pub fn text_image(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    split(content, ctx, false)
}

pub fn gallery(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let columns = content
        .number("columns")
        .map(|c| c.clamp(1.0, 4.0) as usize)
        .unwrap_or(2);
    let cells: Vec<Node> = content
        .list("images")
        .iter()
        .filter_map(|item| {
            let image = item.as_image()?;
            Some(
                Node::column()
                    .width(Size::Fill(1.0))
                    .gap(ctx.size(0.3))
                    .child(ctx.image(&image))
                    .maybe_child(item.text("caption").map(|c| ctx.caption(c))),
            )
        })
        .collect();

    let gap = ctx.size(0.8);
    let rows = grid(cells, columns, gap);
    Node::column()
        .fill()
        .gap(gap)
        .maybe_child(content.text("title").map(|t| ctx.heading(t, 1.8)))
        .children(rows)
}

/// Chunk cells into equal-width rows that share the remaining height
pub(crate) fn grid(cells: Vec<Node>, columns: usize, gap: f32) -> Vec<Node> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut cells = cells.into_iter().peekable();
    while cells.peek().is_some() {
        let mut row = Node::row().height(Size::Fill(1.0)).gap(gap);
        for _ in 0..columns {
            // Pad short rows so cells keep the same width
            row = row.child(cells.next().unwrap_or_else(|| Node::column().width(Size::Fill(1.0))));
        }
        rows.push(row);
    }
    rows
}

pub fn profile(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let portrait = content.image_any(&["image", "portrait", "photo"]);
    let facts = content.list("facts").into_iter().filter_map(|fact| {
        let label = fact.text("label")?;
        let value = fact.text("value").unwrap_or_default();
        Some(
            Node::row()
                .gap(ctx.size(0.5))
                .child(ctx.kicker(label).width(Size::Percent(35.0)))
                .child(ctx.body(value).width(Size::Fill(1.0))),
        )
    });

    let identity = Node::column()
        .width(Size::Fill(1.0))
        .justify(Justify::End)
        .gap(ctx.size(0.4))
        .maybe_child(content.text("name").map(|n| ctx.heading(n, 2.4)))
        .maybe_child(content.text_any(&["role", "title"]).map(|r| ctx.kicker(r)));

    Node::column()
        .fill()
        .gap(ctx.size(1.2))
        .child(
            Node::row()
                .height(Size::Percent(45.0))
                .gap(ctx.size(1.2))
                .align(Align::Stretch)
                .maybe_child(portrait.map(|p| {
                    Node::column()
                        .width(Size::Percent(45.0))
                        .child(ctx.image(&p))
                }))
                .child(identity),
        )
        .maybe_child(content.text("bio").map(|b| ctx.body(b)))
        .child(
            Node::column()
                .gap(ctx.size(0.4))
                .padding(Edges::symmetric(ctx.size(0.6), 0.0))
                .children(facts),
        )
}
