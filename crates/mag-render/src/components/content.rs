//! Read-only access to page data and the shared typographic context

use crate::constants::{REFERENCE_BODY_SIZE, REFERENCE_CONTENT_WIDTH};
use crate::scene::{ImageFit, Node, NodeKind, Rgba, Size, TextAlign, TextStyle};
use crate::types::{PdfSettings, RenderDimensions, RenderOptions};
use serde_json::Value;

/// Borrowed view over a page's opaque content data.
///
/// Lookups are forgiving: missing keys and wrongly typed values read as absent
/// so a half-filled page still renders.
#[derive(Debug, Clone, Copy)]
pub struct PageContent<'a> {
    data: &'a Value,
}

/// An image reference as stored in page data: either a bare source string or
/// an object with `url`/`src`, optional `fit` and `frameOffsetMs`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub fit: ImageFit,
    pub frame_offset_ms: Option<u64>,
}

impl<'a> PageContent<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self { data }
    }

    pub fn raw(&self) -> &'a Value {
        self.data
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty string field
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// First non-empty string among `keys`
    pub fn text_any(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| self.text(key))
    }

    pub fn text_or(&self, key: &str, fallback: &'a str) -> &'a str {
        self.text(key).unwrap_or(fallback)
    }

    /// Numbers may arrive as JSON numbers or numeric strings
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn page_number(&self, key: &str) -> Option<u32> {
        self.number(key)
            .filter(|v| *v >= 1.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn color(&self, key: &str) -> Option<Rgba> {
        self.text(key).and_then(Rgba::parse)
    }

    /// Array items, each viewed as page content
    pub fn list(&self, key: &str) -> Vec<PageContent<'a>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(PageContent::new).collect())
            .unwrap_or_default()
    }

    /// First non-empty array among `keys`
    pub fn list_any(&self, keys: &[&str]) -> Vec<PageContent<'a>> {
        keys.iter()
            .map(|key| self.list(key))
            .find(|items| !items.is_empty())
            .unwrap_or_default()
    }

    pub fn image(&self, key: &str) -> Option<ImageRef> {
        self.get(key).and_then(image_ref)
    }

    pub fn image_any(&self, keys: &[&str]) -> Option<ImageRef> {
        keys.iter().find_map(|key| self.image(key))
    }

    /// Treat this item itself as an image reference
    pub fn as_image(&self) -> Option<ImageRef> {
        image_ref(self.data)
    }

    /// Body text split into paragraphs on blank lines
    pub fn paragraphs(&self, key: &str) -> Vec<&'a str> {
        self.text(key)
            .map(|body| {
                body.split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn image_ref(value: &Value) -> Option<ImageRef> {
    match value {
        Value::String(src) if !src.trim().is_empty() => Some(ImageRef {
            src: src.trim().to_string(),
            fit: ImageFit::Cover,
            frame_offset_ms: None,
        }),
        Value::Object(_) => {
            let item = PageContent::new(value);
            let src = item.text_any(&["url", "src"])?;
            Some(ImageRef {
                src: src.to_string(),
                fit: item.text("fit").map(ImageFit::parse).unwrap_or_default(),
                frame_offset_ms: item.number("frameOffsetMs").map(|v| v.max(0.0) as u64),
            })
        }
        _ => None,
    }
}

/// Colors and type scale derived from the page settings
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub text: Rgba,
    pub muted: Rgba,
    pub accent: Rgba,
    /// Body text size in px, scaled with the content width
    pub base_size: f32,
}

impl Theme {
    pub fn new(settings: &PdfSettings, dimensions: &RenderDimensions, accent: Option<Rgba>) -> Self {
        let background = Rgba::parse_or(&settings.background_color, Rgba::WHITE);
        let (text, muted) = if background.is_dark() {
            (Rgba::rgb(249, 250, 251), Rgba::rgb(209, 213, 219))
        } else {
            (Rgba::rgb(17, 24, 39), Rgba::rgb(75, 85, 99))
        };
        let scale = dimensions.content_width() as f32 / REFERENCE_CONTENT_WIDTH;
        Self {
            background,
            text,
            muted,
            accent: accent.unwrap_or(Rgba::rgb(37, 99, 235)),
            base_size: (REFERENCE_BODY_SIZE * scale).clamp(8.0, 40.0),
        }
    }
}

/// Everything a layout needs besides the page data
#[derive(Debug, Clone)]
pub struct LayoutContext {
    pub dimensions: RenderDimensions,
    pub settings: PdfSettings,
    pub options: RenderOptions,
    pub theme: Theme,
}

impl LayoutContext {
    pub fn new(
        dimensions: RenderDimensions,
        settings: &PdfSettings,
        options: &RenderOptions,
        content: &PageContent<'_>,
    ) -> Self {
        Self {
            theme: Theme::new(settings, &dimensions, content.color("accentColor")),
            dimensions,
            settings: settings.clone(),
            options: options.clone(),
        }
    }

    /// Text size at `scale` times the body size
    pub fn size(&self, scale: f32) -> f32 {
        self.theme.base_size * scale
    }

    pub fn heading(&self, content: &str, scale: f32) -> Node {
        Node::text(
            content,
            TextStyle::new(self.size(scale), self.theme.text).line_height(1.15),
        )
    }

    pub fn body(&self, content: &str) -> Node {
        Node::text(content, TextStyle::new(self.size(1.0), self.theme.text))
    }

    pub fn caption(&self, content: &str) -> Node {
        Node::text(content, TextStyle::new(self.size(0.8), self.theme.muted))
    }

    /// Small uppercase accent label
    pub fn kicker(&self, content: &str) -> Node {
        Node::text(
            content,
            TextStyle::new(self.size(0.75), self.theme.accent).uppercase(),
        )
    }

    pub fn centered(&self, mut node: Node) -> Node {
        if let NodeKind::Text(block) = &mut node.kind {
            block.style.align = TextAlign::Center;
        }
        node
    }

    /// Image filling the space its parent gives it
    pub fn image(&self, image: &ImageRef) -> Node {
        Node::image(image.src.clone(), image.fit)
            .frame_offset(image.frame_offset_ms)
            .fill()
    }

    /// Body paragraphs stacked with paragraph spacing
    pub fn paragraphs(&self, paragraphs: &[&str]) -> Node {
        Node::column()
            .gap(self.size(0.75))
            .children(paragraphs.iter().map(|p| self.body(p)))
    }

    /// Thin accent rule
    pub fn rule(&self, width: f32) -> Node {
        Node::rect(self.theme.accent)
            .width(Size::Px(width))
            .height(Size::Px(self.size(0.2).max(2.0)))
    }
}
