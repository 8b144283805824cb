//! Rasterize a mounted surface into a bitmap
//!
//! Link hotspots are hidden for the duration of the capture and their frames
//! are reported as table-of-contents links instead. The bitmap is rendered at
//! the supersampling scale; reported sizes stay in logical page pixels.

use crate::constants::{MAX_BITMAP_PIXELS, PLACEHOLDER_FILL, PLACEHOLDER_STROKE};
use crate::images::to_data_uri;
use crate::scene::*;
use crate::surface::OffscreenSurface;
use crate::types::*;
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, SpreadMode, Stroke, Transform,
};
use ttf_parser::{Face, OutlineBuilder};

/// A rasterized page
#[derive(Debug, Clone)]
pub struct Capture {
    pub pixmap: Pixmap,
    /// Logical width in px
    pub width: u32,
    /// Logical height in px
    pub height: u32,
    pub scale: f32,
    pub links: Vec<TocEntry>,
}

impl Capture {
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::CaptureFailure(format!("PNG encoding failed: {}", e)))
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(to_data_uri("image/png", &self.encode_png()?))
    }
}

/// Hides link hotspots until dropped
struct HotspotGuard<'a> {
    root: &'a mut Node,
}

impl<'a> HotspotGuard<'a> {
    fn hide(root: &'a mut Node) -> Self {
        set_hotspot_visibility(root, false);
        Self { root }
    }

    fn root(&self) -> &Node {
        self.root
    }
}

impl Drop for HotspotGuard<'_> {
    fn drop(&mut self) {
        set_hotspot_visibility(self.root, true);
    }
}

fn set_hotspot_visibility(root: &mut Node, visible: bool) {
    root.walk_mut(&mut |node| {
        if node.is_hotspot() {
            node.style.visible = visible;
        }
    });
}

/// Rasterize `surface` at `scale` times its logical size
pub async fn capture(surface: &mut OffscreenSurface, fonts: Arc<FontBook>, scale: f32) -> Result<Capture> {
    if surface.is_destroyed() {
        return Err(RenderError::CaptureFailure(
            "surface was destroyed before capture".to_string(),
        ));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::CaptureFailure(format!(
            "invalid supersample scale {scale}"
        )));
    }

    let pending = surface.root().count(&|node| {
        matches!(&node.kind, NodeKind::Image(image) if image.state == ImageState::Pending)
    });
    if pending > 0 {
        return Err(RenderError::CaptureFailure(format!(
            "{pending} image(s) were never resolved"
        )));
    }

    let dims = surface.dimensions();
    let background = surface.background();
    let guard = HotspotGuard::hide(surface.root_mut());
    let scene = guard.root().clone();

    let (pixmap, links) =
        tokio::task::spawn_blocking(move || rasterize(scene, &fonts, dims, background, scale))
            .await??;
    drop(guard);

    log::debug!(
        "Captured {}x{}px at {scale}x ({} links)",
        dims.render_width,
        dims.render_height,
        links.len()
    );

    Ok(Capture {
        pixmap,
        width: dims.render_width,
        height: dims.render_height,
        scale,
        links,
    })
}

fn rasterize(
    mut scene: Node,
    fonts: &FontBook,
    dims: RenderDimensions,
    background: Rgba,
    scale: f32,
) -> Result<(Pixmap, Vec<TocEntry>)> {
    let (pixel_width, pixel_height) = bitmap_size(dims, scale)?;
    let logical = Rect::new(0.0, 0.0, dims.render_width as f32, dims.render_height as f32);
    layout_tree(&mut scene, fonts, logical);

    let mut pixmap = Pixmap::new(pixel_width, pixel_height).ok_or_else(|| {
        RenderError::CaptureFailure(format!(
            "cannot allocate a {pixel_width}x{pixel_height} bitmap"
        ))
    })?;
    pixmap.fill(background.to_skia(1.0));

    let mut painter = Painter {
        pixmap: &mut pixmap,
        fonts,
        transform: Transform::from_scale(scale, scale),
    };
    painter.paint(&scene, 1.0);

    Ok((pixmap, collect_links(&scene)))
}

/// Supersampled bitmap size, refused before allocation when it is too large
fn bitmap_size(dims: RenderDimensions, scale: f32) -> Result<(u32, u32)> {
    let width = (f64::from(dims.render_width) * f64::from(scale)).round();
    let height = (f64::from(dims.render_height) * f64::from(scale)).round();
    if width * height > MAX_BITMAP_PIXELS as f64 {
        return Err(RenderError::CaptureFailure(format!(
            "a {width}x{height} bitmap exceeds the {MAX_BITMAP_PIXELS} pixel limit"
        )));
    }
    Ok((width as u32, height as u32))
}

fn collect_links(scene: &Node) -> Vec<TocEntry> {
    let mut links = Vec::new();
    scene.walk(&mut |node| {
        if let NodeRole::LinkHotspot { target_page } = node.role {
            if !node.frame.is_empty() {
                links.push(TocEntry {
                    source_region: Region {
                        x: node.frame.x,
                        y: node.frame.y,
                        width: node.frame.width,
                        height: node.frame.height,
                    },
                    destination_page: target_page,
                });
            }
        }
    });
    links
}

struct Painter<'a> {
    pixmap: &'a mut Pixmap,
    fonts: &'a FontBook,
    transform: Transform,
}

impl Painter<'_> {
    fn paint(&mut self, node: &Node, inherited_opacity: f32) {
        if !node.style.visible {
            return;
        }
        let opacity = inherited_opacity * node.style.opacity;
        let frame = node.frame;

        if let Some(color) = node.style.background {
            self.fill_rect(frame, color, opacity);
        }

        match &node.kind {
            NodeKind::Container => {}
            NodeKind::Text(block) => self.draw_text(block, frame.inset(node.style.padding), opacity),
            NodeKind::Image(image) => self.draw_image(image, frame.inset(node.style.padding), opacity),
        }

        if let Some(border) = node.style.border {
            self.stroke_rect(frame, border, opacity);
        }

        for child in &node.children {
            self.paint(child, opacity);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba, opacity: f32) {
        let Some(rect) = skia_rect(rect) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color.to_skia(opacity));
        paint.anti_alias = true;
        self.pixmap.fill_rect(rect, &paint, self.transform, None);
    }

    fn stroke_rect(&mut self, rect: Rect, border: Border, opacity: f32) {
        if border.width <= 0.0 {
            return;
        }
        let half = border.width / 2.0;
        let inner = rect.inset(Edges::uniform(half));
        let Some(path) = skia_rect(inner).map(PathBuilder::from_rect) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(border.color.to_skia(opacity));
        paint.anti_alias = true;
        let stroke = Stroke {
            width: border.width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(&path, &paint, &stroke, self.transform, None);
    }

    fn draw_text(&mut self, block: &TextBlock, area: Rect, opacity: f32) {
        let style = &block.style;
        if style.size <= 0.0 || area.width <= 0.0 {
            return;
        }
        let fonts = self.fonts;
        let lines = wrap_text(fonts, &block.content, style, area.width);
        let line_box = style.line_box();
        let half_leading = (line_box - style.size) / 2.0;
        let ascent = fonts.ascent(style);

        let mut paint = Paint::default();
        paint.set_color(style.color.to_skia(opacity));
        paint.anti_alias = true;

        let font = fonts.resolve(style.font.as_deref());
        let face = font.and_then(|f| Face::parse(&f.data, 0).ok());

        for (i, line) in lines.iter().enumerate() {
            let x = match style.align {
                TextAlign::Left => area.x,
                TextAlign::Center => area.x + (area.width - line.width) / 2.0,
                TextAlign::Right => area.right() - line.width,
            };
            let top = area.y + i as f32 * line_box;
            let baseline = top + half_leading + ascent;

            match &face {
                Some(face) => self.draw_glyphs(face, &line.text, x, baseline, style.size, &paint),
                None => {
                    // No fonts installed: keep the text block visible as a bar
                    let bar = Rect::new(x, top + half_leading + style.size * 0.3, line.width, style.size * 0.4);
                    if let Some(rect) = skia_rect(bar) {
                        self.pixmap.fill_rect(rect, &paint, self.transform, None);
                    }
                }
            }
        }
    }

    fn draw_glyphs(&mut self, face: &Face<'_>, text: &str, x: f32, baseline: f32, size: f32, paint: &Paint<'_>) {
        let scale = size / face.units_per_em().max(1) as f32;
        let mut pen_x = x;
        for ch in text.chars() {
            let fallback_advance = size * crate::constants::FALLBACK_ADVANCE_RATIO;
            let Some(gid) = glyph_id(face, ch) else {
                pen_x += fallback_advance;
                continue;
            };
            let mut builder = GlyphPathBuilder::new(pen_x, baseline, scale);
            if face.outline_glyph(gid, &mut builder).is_some() {
                if let Some(path) = builder.finish() {
                    self.pixmap
                        .fill_path(&path, paint, FillRule::Winding, self.transform, None);
                }
            }
            pen_x += glyph_advance(face, ch)
                .map(|adv| adv as f32 * scale)
                .unwrap_or(fallback_advance);
        }
    }

    fn draw_image(&mut self, image: &ImageBox, area: Rect, opacity: f32) {
        if area.is_empty() {
            return;
        }
        let source = match &image.state {
            ImageState::Ready(resolved) => decode_pixmap(resolved),
            _ => None,
        };
        let Some(source) = source else {
            self.draw_placeholder(area, opacity);
            return;
        };

        let (src_w, src_h) = (source.width() as f32, source.height() as f32);
        let dest = fit_rect(area, src_w, src_h, image.fit);
        let visible = intersect(area, dest);
        let Some(visible) = visible.and_then(skia_rect) else {
            return;
        };

        let pattern_transform = Transform::from_row(
            dest.width / src_w,
            0.0,
            0.0,
            dest.height / src_h,
            dest.x,
            dest.y,
        );
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.shader = Pattern::new(
            source.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            opacity.clamp(0.0, 1.0),
            pattern_transform,
        );
        self.pixmap.fill_rect(visible, &paint, self.transform, None);
    }

    fn draw_placeholder(&mut self, area: Rect, opacity: f32) {
        let (r, g, b) = PLACEHOLDER_FILL;
        self.fill_rect(area, Rgba::rgb(r, g, b), opacity);

        let (r, g, b) = PLACEHOLDER_STROKE;
        let stroke_color = Rgba::rgb(r, g, b);
        self.stroke_rect(
            area,
            Border {
                width: 1.0,
                color: stroke_color,
            },
            opacity,
        );

        let mut pb = PathBuilder::new();
        pb.move_to(area.x, area.y);
        pb.line_to(area.right(), area.bottom());
        pb.move_to(area.right(), area.y);
        pb.line_to(area.x, area.bottom());
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(stroke_color.to_skia(opacity));
            paint.anti_alias = true;
            self.pixmap
                .stroke_path(&path, &paint, &Stroke::default(), self.transform, None);
        }
    }
}

/// Destination box of an image of `src_w × src_h` inside `area`
fn fit_rect(area: Rect, src_w: f32, src_h: f32, fit: ImageFit) -> Rect {
    if src_w <= 0.0 || src_h <= 0.0 {
        return area;
    }
    let sx = area.width / src_w;
    let sy = area.height / src_h;
    let scale = match fit {
        ImageFit::Fill => return area,
        ImageFit::Cover => sx.max(sy),
        ImageFit::Contain => sx.min(sy),
    };
    let width = src_w * scale;
    let height = src_h * scale;
    Rect::new(
        area.x + (area.width - width) / 2.0,
        area.y + (area.height - height) / 2.0,
        width,
        height,
    )
}

fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    (right > x && bottom > y).then(|| Rect::new(x, y, right - x, bottom - y))
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

fn decode_pixmap(resolved: &ResolvedImage) -> Option<Pixmap> {
    let rgba = image::load_from_memory(&resolved.bytes).ok()?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let a = src[3];
        dst[0] = premultiply(src[0], a);
        dst[1] = premultiply(src[1], a);
        dst[2] = premultiply(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// Glyph outline builder placing font units at a pen position, y up
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_overflows_and_contain_letterboxes() {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let cover = fit_rect(area, 200.0, 100.0, ImageFit::Cover);
        assert_eq!(cover, Rect::new(-50.0, 0.0, 200.0, 100.0));
        let contain = fit_rect(area, 200.0, 100.0, ImageFit::Contain);
        assert_eq!(contain, Rect::new(0.0, 25.0, 100.0, 50.0));
        assert_eq!(fit_rect(area, 200.0, 100.0, ImageFit::Fill), area);
    }

    #[test]
    fn bitmap_limit_accounts_for_supersampling() {
        let dims = RenderDimensions {
            render_width: 7000,
            render_height: 7000,
            margin_px: 0,
        };
        assert_eq!(bitmap_size(dims, 1.0).unwrap(), (7000, 7000));
        assert!(matches!(
            bitmap_size(dims, 2.0),
            Err(RenderError::CaptureFailure(_))
        ));
    }

    #[test]
    fn hotspot_guard_restores_visibility_on_drop() {
        let mut root = Node::column().child(Node::hotspot(2));
        {
            let guard = HotspotGuard::hide(&mut root);
            assert!(!guard.root().children[0].style.visible);
        }
        assert!(root.children[0].style.visible);
    }
}
