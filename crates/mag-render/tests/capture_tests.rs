use mag_render::scene::{FontBook, ImageFit, Node, Rgba, Size};
use mag_render::*;
use std::sync::Arc;

fn dims(width: u32, height: u32) -> RenderDimensions {
    RenderDimensions {
        render_width: width,
        render_height: height,
        margin_px: 0,
    }
}

fn hotspot_states(root: &Node) -> Vec<bool> {
    let mut states = Vec::new();
    root.walk(&mut |node| {
        if node.is_hotspot() {
            states.push(node.style.visible);
        }
    });
    states
}

#[tokio::test]
async fn test_unresolved_image_refuses_capture() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(200, 100), Rgba::WHITE);
    surface.mount(Node::image("photos/cover.jpg", ImageFit::Cover));

    match capture(&mut surface, Arc::new(FontBook::new()), 2.0).await {
        Err(RenderError::CaptureFailure(msg)) => assert!(msg.contains("never resolved")),
        other => panic!("Expected CaptureFailure, got {:?}", other.map(|c| c.width)),
    }
}

#[tokio::test]
async fn test_failed_rasterization_restores_hotspots() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(7000, 7000), Rgba::WHITE);
    surface.mount(Node::column().child(Node::rect(Rgba::BLACK).height(Size::Px(40.0))));
    surface.overlay(Node::column().child(Node::hotspot(2)).child(Node::hotspot(5)));

    let result = capture(&mut surface, Arc::new(FontBook::new()), 2.0).await;

    assert!(matches!(result, Err(RenderError::CaptureFailure(_))));
    assert_eq!(hotspot_states(surface.root()), vec![true, true]);
}

#[tokio::test]
async fn test_successful_capture_restores_hotspots_and_reports_links() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(120, 80), Rgba::WHITE);
    surface.overlay(Node::hotspot(3));

    let captured = capture(&mut surface, Arc::new(FontBook::new()), 2.0).await.unwrap();

    assert_eq!((captured.pixmap.width(), captured.pixmap.height()), (240, 160));
    assert_eq!(captured.links.len(), 1);
    assert_eq!(captured.links[0].destination_page, 3);
    assert_eq!(hotspot_states(surface.root()), vec![true]);
}
