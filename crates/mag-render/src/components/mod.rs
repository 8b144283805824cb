//! Page layouts and mounting
//!
//! Every page type maps to a [`PageLayout`] that turns page data into a scene
//! subtree. [`mount`] resolves the layout, mounts it on a surface together
//! with link hotspots and the footer, then waits for the layout to settle.

mod content;
mod cover;
mod custom;
mod editorial;
mod footer;
mod media;
mod structured;

pub use content::{ImageRef, LayoutContext, PageContent, Theme};
pub use footer::build_footer;

use crate::scene::{Length, Node};
use crate::surface::OffscreenSurface;
use crate::types::*;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Built-in page layout variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Cover,
    TableOfContents,
    FullImage,
    ImageText,
    TextImage,
    Article,
    TwoColumn,
    Quote,
    Gallery,
    Interview,
    Editorial,
    Profile,
    Timeline,
    Stats,
    Listicle,
    Advertisement,
    SectionDivider,
    Contributors,
    BackCover,
    Custom,
}

impl PageType {
    pub const ALL: [PageType; 20] = [
        PageType::Cover,
        PageType::TableOfContents,
        PageType::FullImage,
        PageType::ImageText,
        PageType::TextImage,
        PageType::Article,
        PageType::TwoColumn,
        PageType::Quote,
        PageType::Gallery,
        PageType::Interview,
        PageType::Editorial,
        PageType::Profile,
        PageType::Timeline,
        PageType::Stats,
        PageType::Listicle,
        PageType::Advertisement,
        PageType::SectionDivider,
        PageType::Contributors,
        PageType::BackCover,
        PageType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Cover => "cover",
            PageType::TableOfContents => "table-of-contents",
            PageType::FullImage => "full-image",
            PageType::ImageText => "image-text",
            PageType::TextImage => "text-image",
            PageType::Article => "article",
            PageType::TwoColumn => "two-column",
            PageType::Quote => "quote",
            PageType::Gallery => "gallery",
            PageType::Interview => "interview",
            PageType::Editorial => "editorial",
            PageType::Profile => "profile",
            PageType::Timeline => "timeline",
            PageType::Stats => "stats",
            PageType::Listicle => "listicle",
            PageType::Advertisement => "advertisement",
            PageType::SectionDivider => "section-divider",
            PageType::Contributors => "contributors",
            PageType::BackCover => "back-cover",
            PageType::Custom => "custom",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase().replace('_', "-");
        PageType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| RenderError::UnknownPageType(s.to_string()))
    }
}

/// Builds the scene subtree for one page type. Must be pure: the same
/// content and context always produce the same tree.
pub trait PageLayout: Send + Sync {
    fn build(&self, content: &PageContent<'_>, ctx: &LayoutContext) -> Node;
}

impl<F> PageLayout for F
where
    F: Fn(&PageContent<'_>, &LayoutContext) -> Node + Send + Sync,
{
    fn build(&self, content: &PageContent<'_>, ctx: &LayoutContext) -> Node {
        self(content, ctx)
    }
}

/// Page type → layout lookup table
#[derive(Clone, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<PageType, Arc<dyn PageLayout>>,
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.layouts.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("LayoutRegistry").field("layouts", &types).finish()
    }
}

impl LayoutRegistry {
    /// Empty registry; every lookup fails until layouts are registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in layouts
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PageType::Cover, cover::cover);
        registry.register(PageType::BackCover, cover::back_cover);
        registry.register(PageType::SectionDivider, cover::section_divider);
        registry.register(PageType::Advertisement, cover::advertisement);
        registry.register(PageType::Article, editorial::article);
        registry.register(PageType::TwoColumn, editorial::two_column);
        registry.register(PageType::Quote, editorial::quote);
        registry.register(PageType::Interview, editorial::interview);
        registry.register(PageType::Editorial, editorial::editorial);
        registry.register(PageType::Listicle, editorial::listicle);
        registry.register(PageType::FullImage, media::full_image);
        registry.register(PageType::ImageText, media::image_text);
        registry.register(PageType::TextImage, media::text_image);
        registry.register(PageType::Gallery, media::gallery);
        registry.register(PageType::Profile, media::profile);
        registry.register(PageType::TableOfContents, structured::table_of_contents);
        registry.register(PageType::Timeline, structured::timeline);
        registry.register(PageType::Stats, structured::stats);
        registry.register(PageType::Contributors, structured::contributors);
        registry.register(PageType::Custom, custom::custom);
        registry
    }

    pub fn register(&mut self, page_type: PageType, layout: impl PageLayout + 'static) {
        self.layouts.insert(page_type, Arc::new(layout));
    }

    pub fn contains(&self, page_type: PageType) -> bool {
        self.layouts.contains_key(&page_type)
    }

    /// Resolve a page type tag to its layout
    pub fn resolve(&self, tag: &str) -> Result<(PageType, Arc<dyn PageLayout>)> {
        let page_type: PageType = tag.parse()?;
        self.layouts
            .get(&page_type)
            .map(|layout| (page_type, Arc::clone(layout)))
            .ok_or_else(|| RenderError::UnknownPageType(tag.to_string()))
    }
}

/// What was mounted on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHandle {
    pub page_type: PageType,
    pub hotspots: usize,
    pub footer: bool,
}

/// Mount a page and its footer on `surface`, then wait for layout to settle
pub async fn mount(
    surface: &mut OffscreenSurface,
    registry: &LayoutRegistry,
    page_type: &str,
    page_data: &Value,
    settings: &PdfSettings,
    options: &RenderOptions,
    settle: Duration,
) -> Result<RenderHandle> {
    let (page_type, layout) = registry.resolve(page_type)?;
    let content = PageContent::new(page_data);
    let ctx = LayoutContext::new(surface.dimensions(), settings, options, &content);

    surface.mount(layout.build(&content, &ctx));

    for marker in link_markers(&content) {
        surface.overlay(marker);
    }

    let footer = if options.show_footer {
        build_footer(&settings.footer_settings, options, &ctx)
    } else {
        None
    };
    let has_footer = footer.is_some();
    if let Some(footer) = footer {
        surface.overlay(footer);
    }

    let hotspots = surface.root().count(&|node| node.is_hotspot());
    log::debug!(
        "Mounted {page_type} on surface #{} ({hotspots} link hotspots, footer: {has_footer})",
        surface.id()
    );

    // Let the mount commit before waiting out the settle delay
    tokio::task::yield_now().await;
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    Ok(RenderHandle {
        page_type,
        hotspots,
        footer: has_footer,
    })
}

/// Explicit `links` markers: page-relative pixel boxes that jump to a page
fn link_markers(content: &PageContent<'_>) -> Vec<Node> {
    content
        .list("links")
        .into_iter()
        .filter_map(|link| {
            let target = link.page_number("pageNumber")?;
            let width = link.number("width").filter(|w| *w > 0.0)?;
            let height = link.number("height").filter(|h| *h > 0.0)?;
            let x = link.number("x").unwrap_or(0.0);
            let y = link.number("y").unwrap_or(0.0);
            Some(Node::hotspot(target).absolute(
                Length::Px(x as f32),
                Length::Px(y as f32),
                Length::Px(width as f32),
                Length::Px(height as f32),
            ))
        })
        .collect()
}
