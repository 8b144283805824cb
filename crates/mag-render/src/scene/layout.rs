//! Box layout over the scene tree
//!
//! A compact flexbox subset: containers stack flow children along their
//! direction, `Size::Fill` children share leftover main-axis space by weight,
//! cross-axis alignment follows `Align`, and absolutely positioned children
//! are placed relative to their parent's border box.

use super::node::*;
use super::text::{FontBook, wrap_text};
use crate::constants::PLACEHOLDER_ASPECT;

/// Lay out `root` into `viewport`, recording every node's frame
pub fn layout_tree(root: &mut Node, fonts: &FontBook, viewport: Rect) {
    layout_node(root, viewport, fonts);
}

fn layout_node(node: &mut Node, frame: Rect, fonts: &FontBook) {
    node.frame = frame;
    let inner = frame.inset(node.style.padding);

    let (main_sizes, cross_sizes) = distribute(node, inner, fonts);
    let flow_count = main_sizes.len();
    let is_row = node.style.direction == Direction::Row;
    let (main_total, cross_total) = if is_row {
        (inner.width, inner.height)
    } else {
        (inner.height, inner.width)
    };

    let used: f32 = main_sizes.iter().sum::<f32>() + node.style.gap * gaps(flow_count);
    let free = (main_total - used).max(0.0);
    let (mut cursor, extra_gap) = match node.style.justify {
        Justify::Start => (0.0, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::End => (free, 0.0),
        Justify::SpaceBetween if flow_count > 1 => (0.0, free / gaps(flow_count)),
        Justify::SpaceBetween => (0.0, 0.0),
    };

    let align = node.style.align;
    let gap = node.style.gap;
    let mut flow_index = 0;
    for child in node.children.iter_mut() {
        match child.style.position {
            Position::Flow => {
                let main = main_sizes[flow_index];
                let cross = cross_sizes[flow_index];
                flow_index += 1;

                let cross_offset = match align {
                    Align::Start | Align::Stretch => 0.0,
                    Align::Center => (cross_total - cross) / 2.0,
                    Align::End => cross_total - cross,
                };
                let child_frame = if is_row {
                    Rect::new(inner.x + cursor, inner.y + cross_offset, main, cross)
                } else {
                    Rect::new(inner.x + cross_offset, inner.y + cursor, cross, main)
                };
                layout_node(child, child_frame, fonts);
                cursor += main + gap + extra_gap;
            }
            Position::Absolute {
                left,
                top,
                width,
                height,
            } => {
                let child_frame = Rect::new(
                    frame.x + left.resolve(frame.width),
                    frame.y + top.resolve(frame.height),
                    width.resolve(frame.width).max(0.0),
                    height.resolve(frame.height).max(0.0),
                );
                layout_node(child, child_frame, fonts);
            }
        }
    }
}

fn gaps(count: usize) -> f32 {
    count.saturating_sub(1) as f32
}

/// Main and cross sizes of every flow child, in child order
fn distribute(node: &Node, inner: Rect, fonts: &FontBook) -> (Vec<f32>, Vec<f32>) {
    let is_row = node.style.direction == Direction::Row;
    let (main_total, cross_total) = if is_row {
        (inner.width, inner.height)
    } else {
        (inner.height, inner.width)
    };
    let flow: Vec<&Node> = node
        .children
        .iter()
        .filter(|c| c.style.position == Position::Flow)
        .collect();

    let mut mains = Vec::with_capacity(flow.len());
    let mut crosses = Vec::with_capacity(flow.len());
    let mut weights = Vec::with_capacity(flow.len());

    for child in &flow {
        let (main_size, cross_size) = if is_row {
            (child.style.width, child.style.height)
        } else {
            (child.style.height, child.style.width)
        };

        if is_row {
            let main = match main_size {
                Size::Px(v) => v,
                Size::Percent(p) => main_total * p / 100.0,
                Size::Auto => measure(child, main_total, cross_total, fonts).0,
                Size::Fill(_) => 0.0,
            };
            mains.push(main);
            crosses.push(0.0);
        } else {
            let cross = resolve_cross(cross_size, cross_total, node.style.align, || {
                measure(child, cross_total, main_total, fonts).0
            });
            let main = match main_size {
                Size::Px(v) => v,
                Size::Percent(p) => main_total * p / 100.0,
                Size::Auto => measure(child, cross, main_total, fonts).1,
                Size::Fill(_) => 0.0,
            };
            mains.push(main);
            crosses.push(cross);
        }
        weights.push(match main_size {
            Size::Fill(w) => w.max(0.0),
            _ => 0.0,
        });
    }

    let total_weight: f32 = weights.iter().sum();
    if total_weight > 0.0 {
        let used: f32 = mains.iter().sum::<f32>() + node.style.gap * gaps(flow.len());
        let free = (main_total - used).max(0.0);
        for (main, weight) in mains.iter_mut().zip(&weights) {
            if *weight > 0.0 {
                *main = free * weight / total_weight;
            }
        }
    }

    // Row cross sizes depend on the final widths
    if is_row {
        for (i, child) in flow.iter().enumerate() {
            let main = mains[i];
            crosses[i] = resolve_cross(child.style.height, cross_total, node.style.align, || {
                measure(child, main, cross_total, fonts).1
            });
        }
    }

    (mains, crosses)
}

fn resolve_cross(size: Size, cross_total: f32, align: Align, intrinsic: impl FnOnce() -> f32) -> f32 {
    match size {
        Size::Px(v) => v,
        Size::Percent(p) => cross_total * p / 100.0,
        Size::Fill(_) => cross_total,
        Size::Auto if align == Align::Stretch => cross_total,
        Size::Auto => intrinsic().min(cross_total),
    }
}

/// Natural (width, height) of a node given the space its parent offers
pub fn measure(node: &Node, avail_width: f32, avail_height: f32, fonts: &FontBook) -> (f32, f32) {
    let pad = node.style.padding;
    let fixed_width = match node.style.width {
        Size::Px(v) => Some(v),
        Size::Percent(p) => Some(avail_width * p / 100.0),
        _ => None,
    };
    let inner_width = (fixed_width.unwrap_or(avail_width) - pad.horizontal()).max(0.0);
    let inner_height = (avail_height - pad.vertical()).max(0.0);

    let (content_width, content_height) = match &node.kind {
        NodeKind::Text(block) => {
            let lines = wrap_text(fonts, &block.content, &block.style, inner_width);
            let widest = lines.iter().map(|l| l.width).fold(0.0, f32::max);
            (widest, lines.len() as f32 * block.style.line_box())
        }
        NodeKind::Image(image) => {
            let aspect = image
                .intrinsic_size()
                .map(|(w, h)| h as f32 / w as f32)
                .unwrap_or(PLACEHOLDER_ASPECT);
            (inner_width, inner_width * aspect)
        }
        NodeKind::Container => measure_children(node, inner_width, inner_height, fonts),
    };

    let width = fixed_width.unwrap_or_else(|| (content_width + pad.horizontal()).min(avail_width));
    let height = match node.style.height {
        Size::Px(v) => v,
        Size::Percent(p) => avail_height * p / 100.0,
        Size::Auto | Size::Fill(_) => content_height + pad.vertical(),
    };
    (width, height)
}

fn measure_children(node: &Node, inner_width: f32, inner_height: f32, fonts: &FontBook) -> (f32, f32) {
    let flow: Vec<&Node> = node
        .children
        .iter()
        .filter(|c| c.style.position == Position::Flow)
        .collect();
    let gap_total = node.style.gap * gaps(flow.len());

    match node.style.direction {
        Direction::Column => {
            let mut width: f32 = 0.0;
            let mut height = gap_total;
            for child in flow {
                let (w, h) = measure(child, inner_width, inner_height, fonts);
                width = width.max(w);
                height += match child.style.height {
                    Size::Fill(_) => 0.0,
                    _ => h,
                };
            }
            (width, height)
        }
        Direction::Row => {
            let mut widths: Vec<f32> = Vec::with_capacity(flow.len());
            let mut weights = 0.0;
            for child in &flow {
                widths.push(match child.style.width {
                    Size::Px(v) => v,
                    Size::Percent(p) => inner_width * p / 100.0,
                    Size::Auto => measure(child, inner_width, inner_height, fonts).0,
                    Size::Fill(w) => {
                        weights += w.max(0.0);
                        0.0
                    }
                });
            }
            let free = (inner_width - widths.iter().sum::<f32>() - gap_total).max(0.0);
            let mut height: f32 = 0.0;
            for (child, width) in flow.iter().zip(widths.iter_mut()) {
                if let Size::Fill(w) = child.style.width {
                    if weights > 0.0 {
                        *width = free * w.max(0.0) / weights;
                    }
                }
                height = height.max(measure(child, *width, inner_height, fonts).1);
            }
            (widths.iter().sum::<f32>() + gap_total, height)
        }
    }
}
