//! Retained layout tree mounted on an off-screen surface

use super::color::Rgba;
use crate::constants::DEFAULT_LINE_HEIGHT;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by edge insets, never below zero size
    pub fn inset(&self, edges: Edges) -> Rect {
        Rect {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.horizontal()).max(0.0),
            height: (self.height - edges.vertical()).max(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Size along one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Size {
    /// Content-sized
    #[default]
    Auto,
    Px(f32),
    /// Percentage of the parent's content box
    Percent(f32),
    /// Share of the parent's leftover main-axis space, by weight
    Fill(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    pub fn resolve(self, base: f32) -> f32 {
        match self {
            Length::Px(v) => v,
            Length::Percent(p) => base * p / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Column,
    Row,
}

/// Cross-axis alignment of children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

/// Main-axis distribution of children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flow,
    /// Placed relative to the parent's border box, out of flow
    Absolute {
        left: Length,
        top: Length,
        width: Length,
        height: Length,
    },
}

impl Position {
    /// Covers the whole parent
    pub fn cover() -> Self {
        Position::Absolute {
            left: Length::Percent(0.0),
            top: Length::Percent(0.0),
            width: Length::Percent(100.0),
            height: Length::Percent(100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub width: Size,
    pub height: Size,
    pub padding: Edges,
    pub gap: f32,
    pub direction: Direction,
    pub align: Align,
    pub justify: Justify,
    pub position: Position,
    pub background: Option<Rgba>,
    pub border: Option<Border>,
    pub opacity: f32,
    pub visible: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: Size::Auto,
            height: Size::Auto,
            padding: Edges::default(),
            gap: 0.0,
            direction: Direction::Column,
            align: Align::Stretch,
            justify: Justify::Start,
            position: Position::Flow,
            background: None,
            border: None,
            opacity: 1.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgba,
    pub align: TextAlign,
    /// Multiple of `size`
    pub line_height: f32,
    /// Font name looked up in the font book; default face when absent
    pub font: Option<String>,
    pub uppercase: bool,
    pub max_lines: Option<usize>,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgba) -> Self {
        Self {
            size,
            color,
            align: TextAlign::Left,
            line_height: DEFAULT_LINE_HEIGHT,
            font: None,
            uppercase: false,
            max_lines: None,
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = Some(lines);
        self
    }

    pub fn line_box(&self) -> f32 {
        self.size * self.line_height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl ImageFit {
    pub fn parse(value: &str) -> Self {
        match value {
            "contain" => ImageFit::Contain,
            "fill" | "stretch" => ImageFit::Fill,
            _ => ImageFit::Cover,
        }
    }
}

/// Image bytes inlined into the tree, with their intrinsic size
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    /// Source not yet resolved; capturing in this state fails
    Pending,
    Ready(Arc<ResolvedImage>),
    Placeholder { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub src: String,
    pub fit: ImageFit,
    /// Frame position for video poster thumbnails
    pub frame_offset_ms: Option<u64>,
    pub state: ImageState,
}

impl ImageBox {
    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        match &self.state {
            ImageState::Ready(image) if image.width > 0 && image.height > 0 => {
                Some((image.width, image.height))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Container,
    Text(TextBlock),
    Image(ImageBox),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeRole {
    #[default]
    Content,
    /// Interactive overlay linking to another page; hidden while capturing
    LinkHotspot { target_page: u32 },
    Footer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub style: Style,
    pub role: NodeRole,
    pub children: Vec<Node>,
    /// Border box computed by the last layout pass
    pub frame: Rect,
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            style: Style::default(),
            role: NodeRole::Content,
            children: Vec::new(),
            frame: Rect::default(),
        }
    }

    pub fn column() -> Self {
        Self::with_kind(NodeKind::Container)
    }

    pub fn row() -> Self {
        let mut node = Self::with_kind(NodeKind::Container);
        node.style.direction = Direction::Row;
        node
    }

    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Self::with_kind(NodeKind::Text(TextBlock {
            content: content.into(),
            style,
        }))
    }

    pub fn image(src: impl Into<String>, fit: ImageFit) -> Self {
        Self::with_kind(NodeKind::Image(ImageBox {
            src: src.into(),
            fit,
            frame_offset_ms: None,
            state: ImageState::Pending,
        }))
    }

    /// Solid block, typically used as a rule or a color swatch
    pub fn rect(color: Rgba) -> Self {
        let mut node = Self::with_kind(NodeKind::Container);
        node.style.background = Some(color);
        node
    }

    /// Transparent overlay covering its parent that links to `target_page`
    pub fn hotspot(target_page: u32) -> Self {
        let mut node = Self::with_kind(NodeKind::Container);
        node.style.position = Position::cover();
        node.style.background = Some(Rgba::rgb(59, 130, 246).with_alpha(40));
        node.role = NodeRole::LinkHotspot { target_page };
        node
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn maybe_child(mut self, child: Option<Node>) -> Self {
        if let Some(child) = child {
            self.children.push(child);
        }
        self
    }

    pub fn width(mut self, width: Size) -> Self {
        self.style.width = width;
        self
    }

    pub fn height(mut self, height: Size) -> Self {
        self.style.height = height;
        self
    }

    pub fn fill(self) -> Self {
        self.width(Size::Fill(1.0)).height(Size::Fill(1.0))
    }

    pub fn padding(mut self, padding: Edges) -> Self {
        self.style.padding = padding;
        self
    }

    pub fn gap(mut self, gap: f32) -> Self {
        self.style.gap = gap;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.style.align = align;
        self
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.style.justify = justify;
        self
    }

    pub fn background(mut self, color: Rgba) -> Self {
        self.style.background = Some(color);
        self
    }

    pub fn border(mut self, width: f32, color: Rgba) -> Self {
        self.style.border = Some(Border { width, color });
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.style.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn absolute(mut self, left: Length, top: Length, width: Length, height: Length) -> Self {
        self.style.position = Position::Absolute {
            left,
            top,
            width,
            height,
        };
        self
    }

    pub fn role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn frame_offset(mut self, offset_ms: Option<u64>) -> Self {
        if let NodeKind::Image(image) = &mut self.kind {
            image.frame_offset_ms = offset_ms;
        }
        self
    }

    pub fn is_hotspot(&self) -> bool {
        matches!(self.role, NodeRole::LinkHotspot { .. })
    }

    /// Visit every node depth-first, parents before children
    pub fn walk(&self, f: &mut dyn FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Mutable borrows of every image box in the subtree
    pub fn images_mut(&mut self) -> Vec<&mut ImageBox> {
        let mut out = Vec::new();
        collect_images(self, &mut out);
        out
    }

    pub fn count(&self, predicate: &dyn Fn(&Node) -> bool) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if predicate(node) {
                n += 1;
            }
        });
        n
    }
}

fn collect_images<'a>(node: &'a mut Node, out: &mut Vec<&'a mut ImageBox>) {
    let Node { kind, children, .. } = node;
    if let NodeKind::Image(image) = kind {
        out.push(image);
    }
    for child in children.iter_mut() {
        collect_images(child, out);
    }
}
