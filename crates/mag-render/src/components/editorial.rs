//! Text-led layouts

use super::content::{LayoutContext, PageContent};
use crate::scene::{Align, Edges, Justify, Node, Size, TextAlign, TextStyle};

/// Title block shared by most text layouts: kicker, headline, byline
fn header(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    Node::column()
        .gap(ctx.size(0.5))
        .maybe_child(content.text_any(&["category", "kicker"]).map(|k| ctx.kicker(k)))
        .maybe_child(content.text("title").map(|t| ctx.heading(t, 2.2)))
        .maybe_child(content.text("subtitle").map(|t| ctx.heading(t, 1.2)))
        .maybe_child(content.text("author").map(|a| ctx.caption(&format!("By {a}"))))
}

pub fn article(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let mut page = Node::column().fill().gap(ctx.size(1.2)).child(header(content, ctx));
    if let Some(image) = content.image_any(&["heroImage", "image"]) {
        page = page.child(ctx.image(&image).height(Size::Percent(35.0)));
    }
    page.child(ctx.paragraphs(&content.paragraphs("body")))
}

pub fn two_column(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let (left, right) = match (content.paragraphs("leftColumn"), content.paragraphs("rightColumn")) {
        (left, right) if !left.is_empty() || !right.is_empty() => (left, right),
        _ => {
            let body = content.paragraphs("body");
            let split = body.len().div_ceil(2);
            let (left, right) = body.split_at(split);
            (left.to_vec(), right.to_vec())
        }
    };

    Node::column()
        .fill()
        .gap(ctx.size(1.2))
        .child(header(content, ctx))
        .child(
            Node::row()
                .gap(ctx.size(1.5))
                .align(Align::Start)
                .child(ctx.paragraphs(&left).width(Size::Fill(1.0)))
                .child(ctx.paragraphs(&right).width(Size::Fill(1.0))),
        )
}

pub fn quote(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let mark = Node::text(
        "\u{201C}",
        TextStyle::new(ctx.size(6.0), ctx.theme.accent).line_height(0.9),
    );
    let quote = Node::text(
        content.text_any(&["quote", "text"]).unwrap_or_default(),
        TextStyle::new(ctx.size(2.0), ctx.theme.text)
            .line_height(1.3)
            .align(TextAlign::Center),
    );
    let attribution = content.text_any(&["attribution", "author"]).map(|who| {
        let line = match content.text("role") {
            Some(role) => format!("\u{2014} {who}, {role}"),
            None => format!("\u{2014} {who}"),
        };
        ctx.centered(ctx.caption(&line))
    });

    Node::column()
        .fill()
        .justify(Justify::Center)
        .align(Align::Center)
        .padding(Edges::symmetric(0.0, ctx.size(2.0)))
        .gap(ctx.size(1.0))
        .child(mark)
        .child(quote)
        .maybe_child(attribution)
}

pub fn interview(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let exchanges = content.list_any(&["questions", "qa"]).into_iter().map(|qa| {
        let question = Node::text(
            qa.text("question").unwrap_or_default(),
            TextStyle::new(ctx.size(1.05), ctx.theme.accent),
        );
        Node::column()
            .gap(ctx.size(0.4))
            .child(question)
            .maybe_child(qa.text("answer").map(|a| ctx.body(a)))
    });

    Node::column()
        .fill()
        .gap(ctx.size(1.1))
        .child(header(content, ctx))
        .maybe_child(content.text("intro").map(|i| ctx.caption(i)))
        .children(exchanges)
}

pub fn editorial(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let mut page = Node::column()
        .fill()
        .gap(ctx.size(1.2))
        .child(header(content, ctx))
        .child(ctx.rule(ctx.size(4.0)))
        .child(ctx.paragraphs(&content.paragraphs("body")));

    if let Some(signature) = content.text("signature") {
        page = page.child(
            Node::text(
                signature,
                TextStyle::new(ctx.size(1.3), ctx.theme.text).align(TextAlign::Right),
            ),
        );
    }
    page
}

pub fn listicle(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let items = content.list("items").into_iter().enumerate().map(|(i, item)| {
        let number = Node::text(
            format!("{:02}", i + 1),
            TextStyle::new(ctx.size(2.0), ctx.theme.accent),
        )
        .width(Size::Px(ctx.size(3.0)));
        let body = Node::column()
            .width(Size::Fill(1.0))
            .gap(ctx.size(0.3))
            .maybe_child(
                item.text("title")
                    .or_else(|| item.raw().as_str())
                    .map(|t| ctx.heading(t, 1.2)),
            )
            .maybe_child(item.text("description").map(|d| ctx.body(d)));
        Node::row().align(Align::Start).gap(ctx.size(0.8)).child(number).child(body)
    });

    Node::column()
        .fill()
        .gap(ctx.size(1.0))
        .child(header(content, ctx))
        .maybe_child(content.text("intro").map(|i| ctx.body(i)))
        .children(items)
}
