//! List and data layouts, including the linked table of contents

use super::content::{LayoutContext, PageContent};
use super::media::grid;
use crate::scene::{Align, Edges, Justify, Node, Size, TextAlign, TextStyle};

/// Each entry row carries a link hotspot to its page, so the captured
/// page reports one link per entry with a page number.
pub fn table_of_contents(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let entries = content
        .list_any(&["entries", "items"])
        .into_iter()
        .filter_map(|entry| {
            let title = entry.text("title")?;
            let target = entry.page_number("pageNumber");

            let label = Node::column()
                .width(Size::Fill(1.0))
                .gap(ctx.size(0.2))
                .child(ctx.heading(title, 1.2))
                .maybe_child(entry.text("description").map(|d| ctx.caption(d)));
            let number = target.map(|page| {
                Node::text(
                    page.to_string(),
                    TextStyle::new(ctx.size(1.2), ctx.theme.accent).align(TextAlign::Right),
                )
            });

            Some(
                Node::row()
                    .gap(ctx.size(1.0))
                    .align(Align::Center)
                    .padding(Edges::symmetric(ctx.size(0.5), 0.0))
                    .border(1.0, ctx.theme.muted.with_alpha(60))
                    .child(label)
                    .maybe_child(number)
                    .maybe_child(target.map(Node::hotspot)),
            )
        });

    Node::column()
        .fill()
        .gap(ctx.size(0.6))
        .child(ctx.heading(content.text_or("title", "Contents"), 2.4))
        .maybe_child(content.text("subtitle").map(|s| ctx.caption(s)))
        .child(ctx.rule(ctx.size(4.0)))
        .children(entries)
}

pub fn timeline(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let dot = ctx.size(0.7);
    let events = content.list_any(&["events", "items"]).into_iter().map(|event| {
        let marker = Node::column()
            .width(Size::Px(dot))
            .height(Size::Px(dot))
            .background(ctx.theme.accent);
        let detail = Node::column()
            .width(Size::Fill(1.0))
            .gap(ctx.size(0.2))
            .maybe_child(event.text_any(&["date", "year"]).map(|d| ctx.kicker(d)))
            .maybe_child(event.text("title").map(|t| ctx.heading(t, 1.2)))
            .maybe_child(event.text("description").map(|d| ctx.body(d)));
        Node::row()
            .align(Align::Start)
            .gap(ctx.size(0.8))
            .child(marker)
            .child(detail)
    });

    Node::column()
        .fill()
        .gap(ctx.size(1.0))
        .maybe_child(content.text("title").map(|t| ctx.heading(t, 2.2)))
        .child(
            Node::column()
                .gap(ctx.size(1.0))
                .padding(Edges {
                    left: ctx.size(0.3),
                    ..Edges::default()
                })
                .children(events),
        )
}

pub fn stats(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let columns = content
        .number("columns")
        .map(|c| c.clamp(1.0, 4.0) as usize)
        .unwrap_or(2);
    let cells: Vec<Node> = content
        .list("stats")
        .into_iter()
        .map(|stat| {
            let value = Node::text(
                stat.text("value").unwrap_or("–"),
                TextStyle::new(ctx.size(3.2), ctx.theme.accent)
                    .line_height(1.0)
                    .align(TextAlign::Center),
            );
            Node::column()
                .width(Size::Fill(1.0))
                .justify(Justify::Center)
                .align(Align::Center)
                .gap(ctx.size(0.4))
                .background(ctx.theme.muted.with_alpha(24))
                .padding(Edges::uniform(ctx.size(0.8)))
                .child(value)
                .maybe_child(stat.text("label").map(|l| ctx.centered(ctx.caption(l))))
        })
        .collect();

    let gap = ctx.size(1.0);
    Node::column()
        .fill()
        .gap(gap)
        .maybe_child(content.text("title").map(|t| ctx.heading(t, 2.2)))
        .maybe_child(content.text("intro").map(|i| ctx.body(i)))
        .children(grid(cells, columns, gap))
}

pub fn contributors(content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
    let people = content
        .list_any(&["contributors", "people"])
        .into_iter()
        .filter_map(|person| {
            let name = person.text("name")?;
            let avatar = person.image_any(&["image", "photo"]).map(|image| {
                let side = ctx.size(4.0);
                Node::image(image.src, image.fit)
                    .width(Size::Px(side))
                    .height(Size::Px(side))
            });
            let text = Node::column()
                .width(Size::Fill(1.0))
                .gap(ctx.size(0.2))
                .child(ctx.heading(name, 1.1))
                .maybe_child(person.text("role").map(|r| ctx.kicker(r)))
                .maybe_child(person.text("bio").map(|b| ctx.caption(b)));
            Some(
                Node::row()
                    .align(Align::Start)
                    .gap(ctx.size(0.8))
                    .maybe_child(avatar)
                    .child(text),
            )
        });

    Node::column()
        .fill()
        .gap(ctx.size(1.0))
        .child(ctx.heading(content.text_or("title", "Contributors"), 2.2))
        .children(people)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::content::Theme;
    use crate::scene::{NodeRole, Rgba};
    use crate::types::*;
    use serde_json::json;

    fn ctx() -> LayoutContext {
        let dims = RenderDimensions {
            render_width: 793,
            render_height: 1123,
            margin_px: 38,
        };
        let settings = PdfSettings::default();
        LayoutContext {
            theme: Theme::new(&settings, &dims, Some(Rgba::rgb(200, 0, 0))),
            dimensions: dims,
            settings,
            options: RenderOptions::default(),
        }
    }

    #[test]
    fn toc_entries_with_page_numbers_get_hotspots() {
        let data = json!({
            "title": "In this issue",
            "entries": [
                { "title": "Intro", "pageNumber": 3 },
                { "title": "Letters", "pageNumber": "7" },
                { "title": "Unnumbered" }
            ]
        });
        let node = table_of_contents(&PageContent::new(&data), &ctx());

        let mut targets = Vec::new();
        node.walk(&mut |n| {
            if let NodeRole::LinkHotspot { target_page } = n.role {
                targets.push(target_page);
            }
        });
        assert_eq!(targets, vec![3, 7]);
    }

    #[test]
    fn stats_grid_pads_short_rows() {
        let data = json!({ "stats": [{ "value": "1" }, { "value": "2" }, { "value": "3" }] });
        let node = stats(&PageContent::new(&data), &ctx());
        // Two rows of two cells
        assert_eq!(node.children.len(), 2);
        assert!(node.children.iter().all(|row| row.children.len() == 2));
    }
}
