//! Off-screen render surfaces
//!
//! A surface owns an isolated scene root sized exactly to the page, with the
//! background fill and the margin applied as padding so mounted content sees
//! the same constraints as the printed page. Surfaces are never shown; they
//! exist only to be laid out and rasterized.

use crate::scene::{Edges, Node, Position, Rgba, Size};
use crate::types::RenderDimensions;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Creates surfaces and keeps count of their lifecycles
#[derive(Debug, Default)]
pub struct SurfaceHost {
    next_id: AtomicU64,
    live: AtomicUsize,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl SurfaceHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn create(self: &Arc<Self>, dimensions: RenderDimensions, background: Rgba) -> OffscreenSurface {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Created surface #{id} ({}x{}px, margin {}px)",
            dimensions.render_width,
            dimensions.render_height,
            dimensions.margin_px
        );

        let root = Node::column()
            .width(Size::Px(dimensions.render_width as f32))
            .height(Size::Px(dimensions.render_height as f32))
            .padding(Edges::uniform(dimensions.margin_px as f32))
            .background(background);

        OffscreenSurface {
            id,
            dimensions,
            background,
            root,
            host: Arc::clone(self),
            destroyed: false,
        }
    }

    /// Surfaces created and not yet destroyed
    pub fn live_surfaces(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct OffscreenSurface {
    id: u64,
    dimensions: RenderDimensions,
    background: Rgba,
    root: Node,
    host: Arc<SurfaceHost>,
    destroyed: bool,
}

impl OffscreenSurface {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dimensions(&self) -> RenderDimensions {
        self.dimensions
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Mount page content into the padded content box
    pub fn mount(&mut self, content: Node) {
        self.root.children.push(content);
    }

    /// Mount an out-of-flow layer (footer, link hotspots). Positions are
    /// relative to the full page, margins included.
    pub fn overlay(&mut self, mut layer: Node) {
        if layer.style.position == Position::Flow {
            layer.style.position = Position::cover();
        }
        self.root.children.push(layer);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release the surface. Calling this again is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.root.children.clear();
        self.host.live.fetch_sub(1, Ordering::SeqCst);
        self.host.destroyed.fetch_add(1, Ordering::SeqCst);
        log::debug!("Destroyed surface #{}", self.id);
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        self.destroy();
    }
}
