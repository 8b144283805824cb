use mag_render::scene::{NodeKind, NodeRole, Rgba};
use mag_render::*;
use serde_json::json;
use std::time::Duration;

fn dims() -> RenderDimensions {
    compute_dimensions(&PdfSettings::default()).unwrap()
}

fn sample_data() -> serde_json::Value {
    json!({
        "title": "Sample",
        "subtitle": "Subtitle",
        "body": "First paragraph.\n\nSecond paragraph.",
        "image": "data:image/png;base64,AAAA",
        "quote": "Quoted words",
        "attribution": "Someone",
        "entries": [{ "title": "Intro", "pageNumber": 3 }],
        "items": [{ "title": "One", "description": "First" }],
        "questions": [{ "question": "Why?", "answer": "Because." }],
        "images": ["a.jpg", { "url": "b.jpg", "caption": "B" }],
        "events": [{ "date": "2024", "title": "Launch" }],
        "stats": [{ "value": "42", "label": "Answers" }],
        "contributors": [{ "name": "Ada", "role": "Editor" }],
        "elements": [
            { "type": "heading", "content": "Free", "x": 10, "y": 10, "width": 80, "height": 10 },
            { "type": "image", "src": "c.jpg", "x": 10, "y": 30, "width": 80, "height": 40 }
        ]
    })
}

#[tokio::test]
async fn test_every_builtin_type_mounts() {
    let registry = LayoutRegistry::builtin();
    let host = SurfaceHost::new();
    let data = sample_data();

    for page_type in PageType::ALL {
        assert!(registry.contains(page_type));
        let mut surface = host.create(dims(), Rgba::WHITE);
        let handle = mount(
            &mut surface,
            &registry,
            page_type.as_str(),
            &data,
            &PdfSettings::default(),
            &RenderOptions::default(),
            Duration::ZERO,
        )
        .await
        .unwrap_or_else(|e| panic!("{page_type} failed to mount: {e}"));

        assert_eq!(handle.page_type, page_type);
        assert_eq!(surface.root().children.len(), 1, "{page_type}");
    }
    assert_eq!(host.live_surfaces(), 0);
}

#[tokio::test]
async fn test_unknown_page_type_fails() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);
    let result = mount(
        &mut surface,
        &LayoutRegistry::builtin(),
        "hologram",
        &json!({}),
        &PdfSettings::default(),
        &RenderOptions::default(),
        Duration::ZERO,
    )
    .await;

    match result {
        Err(RenderError::UnknownPageType(tag)) => assert_eq!(tag, "hologram"),
        other => panic!("Expected UnknownPageType, got {:?}", other),
    }
    assert!(surface.root().children.is_empty());
}

#[tokio::test]
async fn test_unregistered_type_fails() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);
    let result = mount(
        &mut surface,
        &LayoutRegistry::new(),
        "cover",
        &json!({}),
        &PdfSettings::default(),
        &RenderOptions::default(),
        Duration::ZERO,
    )
    .await;
    assert!(matches!(result, Err(RenderError::UnknownPageType(_))));
}

#[tokio::test]
async fn test_custom_layout_can_be_registered() {
    let mut registry = LayoutRegistry::new();
    registry.register(
        PageType::Quote,
        |content: &components::PageContent<'_>, ctx: &components::LayoutContext| {
            ctx.heading(content.text_or("quote", "-"), 1.0)
        },
    );

    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);
    mount(
        &mut surface,
        &registry,
        "quote",
        &json!({ "quote": "Hello" }),
        &PdfSettings::default(),
        &RenderOptions::default(),
        Duration::ZERO,
    )
    .await
    .unwrap();

    let content = &surface.root().children[0];
    assert!(matches!(&content.kind, NodeKind::Text(t) if t.content == "Hello"));
}

#[tokio::test]
async fn test_footer_and_link_markers_are_overlaid() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);

    let mut settings = PdfSettings::default();
    settings.footer_settings.enabled = true;
    let data = json!({
        "title": "Article",
        "links": [
            { "pageNumber": 5, "x": 10, "y": 20, "width": 100, "height": 30 },
            { "pageNumber": 6 }
        ]
    });

    let handle = mount(
        &mut surface,
        &LayoutRegistry::builtin(),
        "article",
        &data,
        &settings,
        &RenderOptions::default(),
        Duration::ZERO,
    )
    .await
    .unwrap();

    // The marker without a box is ignored
    assert_eq!(handle.hotspots, 1);
    assert!(handle.footer);
    let roles: Vec<NodeRole> = surface.root().children.iter().map(|c| c.role).collect();
    assert_eq!(
        roles,
        vec![
            NodeRole::Content,
            NodeRole::LinkHotspot { target_page: 5 },
            NodeRole::Footer
        ]
    );
}

#[tokio::test]
async fn test_show_footer_false_suppresses_footer() {
    let host = SurfaceHost::new();
    let mut surface = host.create(dims(), Rgba::WHITE);
    let mut settings = PdfSettings::default();
    settings.footer_settings.enabled = true;
    let options = RenderOptions {
        show_footer: false,
        ..RenderOptions::default()
    };

    let handle = mount(
        &mut surface,
        &LayoutRegistry::builtin(),
        "quote",
        &json!({ "quote": "Hi" }),
        &settings,
        &options,
        Duration::ZERO,
    )
    .await
    .unwrap();
    assert!(!handle.footer);
}

#[test]
fn test_page_type_tags_round_trip() {
    for page_type in PageType::ALL {
        assert_eq!(page_type.as_str().parse::<PageType>().unwrap(), page_type);
    }
    assert_eq!("Table_Of_Contents".parse::<PageType>().unwrap(), PageType::TableOfContents);
    assert!("".parse::<PageType>().is_err());
}
