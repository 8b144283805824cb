//! Page footer overlay
//!
//! Up to three label groups (page number, issue title, site URL), each with
//! its own color and side. Groups on the same side stack vertically in the
//! order page number, title, URL. The footer sits in the bottom margin band
//! and spans the full page width.

use super::content::LayoutContext;
use crate::scene::{Align, Edges, Length, Node, NodeRole, Rgba, Size, TextAlign, TextStyle};
use crate::types::{Alignment, FooterSettings, LabelGroup, RenderOptions};

/// Minimum inset of footer labels from the page edges, in px
const MIN_SIDE_INSET: f32 = 16.0;

pub fn build_footer(
    settings: &FooterSettings,
    options: &RenderOptions,
    ctx: &LayoutContext,
) -> Option<Node> {
    if !settings.enabled {
        return None;
    }

    let page_label = settings
        .page_number_format
        .format(options.page_number, options.total_pages);
    let groups: Vec<(&LabelGroup, String)> = [
        (settings.page_number.as_ref(), Some(page_label)),
        (settings.title.as_ref(), options.issue_title.clone()),
        (settings.url.as_ref(), options.site_url.clone()),
    ]
    .into_iter()
    .filter_map(|(group, text)| Some((group?, text.filter(|t| !t.trim().is_empty())?)))
    .collect();

    if groups.is_empty() {
        return None;
    }

    let font_size = if settings.font_size > 0.0 {
        settings.font_size
    } else {
        10.0
    };
    let label = |group: &LabelGroup, text: &str, align: TextAlign| {
        let color = Rgba::parse_or(&group.color, ctx.theme.muted);
        Node::text(text, TextStyle::new(font_size, color).align(align).max_lines(1))
    };

    let column = |side: Alignment| {
        let align = match side {
            Alignment::Left => TextAlign::Left,
            Alignment::Right => TextAlign::Right,
        };
        Node::column()
            .align(match side {
                Alignment::Left => Align::Start,
                Alignment::Right => Align::End,
            })
            .gap(font_size * 0.25)
            .children(
                groups
                    .iter()
                    .filter(|(group, _)| group.align == side)
                    .map(|(group, text)| label(group, text, align)),
            )
    };

    let rows_per_side = [Alignment::Left, Alignment::Right]
        .into_iter()
        .map(|side| groups.iter().filter(|(g, _)| g.align == side).count())
        .max()
        .unwrap_or(1) as f32;
    let line_box = TextStyle::new(font_size, Rgba::BLACK).line_box();
    let stack_height = rows_per_side * line_box + (rows_per_side - 1.0) * font_size * 0.25;

    let dims = ctx.dimensions;
    let margin = dims.margin_px as f32;
    let band = margin.max(stack_height + font_size);
    let inset = margin.max(MIN_SIDE_INSET);

    Some(
        Node::row()
            .role(NodeRole::Footer)
            .align(Align::Center)
            .padding(Edges::symmetric(0.0, inset))
            .child(column(Alignment::Left))
            .child(Node::column().width(Size::Fill(1.0)))
            .child(column(Alignment::Right))
            .absolute(
                Length::Px(0.0),
                Length::Px(dims.render_height as f32 - band),
                Length::Percent(100.0),
                Length::Px(band),
            ),
    )
}
