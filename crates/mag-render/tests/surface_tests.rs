use mag_render::scene::{Node, Rgba, Size};
use mag_render::*;

fn dims() -> RenderDimensions {
    RenderDimensions {
        render_width: 400,
        render_height: 300,
        margin_px: 20,
    }
}

#[test]
fn test_surface_root_matches_page_size() {
    let host = SurfaceHost::new();
    let surface = host.create(dims(), Rgba::WHITE);

    let root = surface.root();
    assert_eq!(root.style.width, Size::Px(400.0));
    assert_eq!(root.style.height, Size::Px(300.0));
    assert_eq!(root.style.padding.left, 20.0);
    assert_eq!(root.style.background, Some(Rgba::WHITE));
}

#[test]
fn test_destroy_is_idempotent() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);
    surface.mount(Node::column());

    surface.destroy();
    surface.destroy();

    assert!(surface.is_destroyed());
    assert!(surface.root().children.is_empty());
    assert_eq!(host.live_surfaces(), 0);
    assert_eq!(host.destroyed_count(), 1);
}

#[test]
fn test_destroy_leaves_other_surfaces_alone() {
    let host = SurfaceHost::new();
    let mut first = host.create(dims(), Rgba::WHITE);
    let mut second = host.create(dims(), Rgba::BLACK);
    second.mount(Node::column());

    first.destroy();
    first.destroy();

    assert!(!second.is_destroyed());
    assert_eq!(second.root().children.len(), 1);
    assert_eq!(host.live_surfaces(), 1);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_drop_destroys_once() {
    let host = SurfaceHost::new();
    {
        let mut surface = host.create(dims(), Rgba::WHITE);
        surface.destroy();
    }
    {
        let _surface = host.create(dims(), Rgba::WHITE);
    }
    assert_eq!(host.created_count(), 2);
    assert_eq!(host.destroyed_count(), 2);
    assert_eq!(host.live_surfaces(), 0);
}
