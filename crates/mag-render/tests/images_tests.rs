use futures::future::BoxFuture;
use mag_render::images::*;
use mag_render::scene::{ImageFit, ImageState, Node, NodeKind};
use mag_render::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Serves canned responses and records every requested URL
#[derive(Default)]
struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ImageFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<Fetched, String>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .map(|bytes| Fetched {
                    bytes: bytes.clone(),
                    content_type: Some("image/png".to_string()),
                })
                .ok_or_else(|| "HTTP 404 Not Found".to_string())
        })
    }
}

fn resolver(fetcher: Arc<StaticFetcher>, policy: SourcePolicy) -> ImageResolver {
    ImageResolver::new(fetcher, Arc::new(LruFrameCache::new(8)), policy)
}

fn states(root: &Node) -> Vec<ImageState> {
    let mut out = Vec::new();
    root.walk(&mut |node| {
        if let NodeKind::Image(image) = &node.kind {
            out.push(image.state.clone());
        }
    });
    out
}

#[tokio::test]
async fn test_data_uri_is_decoded_in_place() {
    let src = to_data_uri("image/png", &png_bytes(4, 2));
    let mut root = Node::column().child(Node::image(src.clone(), ImageFit::Cover));

    let report = resolver(Arc::new(StaticFetcher::default()), SourcePolicy::default())
        .process_images(&mut root, &mut |_| {})
        .await;

    assert_eq!(report.resolved, 1);
    assert!(report.failures.is_empty());
    match &states(&root)[0] {
        ImageState::Ready(image) => assert_eq!((image.width, image.height), (4, 2)),
        other => panic!("Expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cross_origin_sources_use_the_proxy() {
    let remote = "https://firebasestorage.googleapis.com/v0/b/mag/o/cover.png";
    let other = "https://cdn.example.com/photo.png";
    let proxied = proxied_url("https://editor.example.com/api/proxy", remote).unwrap();

    let fetcher = Arc::new(
        StaticFetcher::default()
            .with(&proxied, png_bytes(8, 8))
            .with(other, png_bytes(2, 2)),
    );
    let policy = SourcePolicy {
        proxy_endpoint: Some("https://editor.example.com/api/proxy".to_string()),
        cross_origin_hosts: vec!["firebasestorage.googleapis.com".to_string()],
        asset_root: None,
    };
    let mut root = Node::column()
        .child(Node::image(remote, ImageFit::Cover))
        .child(Node::image(other, ImageFit::Contain));

    let report = resolver(Arc::clone(&fetcher), policy)
        .process_images(&mut root, &mut |_| {})
        .await;

    assert_eq!(report.resolved, 2);
    assert_eq!(fetcher.requests(), vec![proxied, other.to_string()]);

    // Sources are inlined once resolved
    root.walk(&mut |node| {
        if let NodeKind::Image(image) = &node.kind {
            assert!(image.src.starts_with("data:image/png;base64,"));
        }
    });
}

#[tokio::test]
async fn test_failed_image_becomes_placeholder_and_batch_continues() {
    let ok = "https://cdn.example.com/ok.png";
    let fetcher = Arc::new(StaticFetcher::default().with(ok, png_bytes(3, 3)));
    let mut root = Node::column()
        .child(Node::image("https://cdn.example.com/missing.png", ImageFit::Cover))
        .child(Node::image(ok, ImageFit::Cover))
        .child(Node::image("", ImageFit::Cover));

    let mut events = Vec::new();
    let report = resolver(fetcher, SourcePolicy::default())
        .process_images(&mut root, &mut |p| events.push(p))
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.resolved, 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].src, "https://cdn.example.com/missing.png");

    let states = states(&root);
    assert!(matches!(states[0], ImageState::Placeholder { .. }));
    assert!(matches!(states[1], ImageState::Ready(_)));
    assert!(matches!(states[2], ImageState::Placeholder { .. }));

    assert_eq!(
        events,
        vec![
            RenderProgress::Image { done: 1, total: 3 },
            RenderProgress::Image { done: 2, total: 3 },
            RenderProgress::Image { done: 3, total: 3 },
        ]
    );

    let error: RenderError = report.failures[0].clone().into();
    assert!(matches!(error, RenderError::ImageResolution { .. }));
}

#[tokio::test]
async fn test_repeated_frames_come_from_cache() {
    let src = "https://cdn.example.com/clip-poster.png";
    let fetcher = Arc::new(StaticFetcher::default().with(src, png_bytes(2, 2)));
    let resolver = resolver(Arc::clone(&fetcher), SourcePolicy::default());

    for expected_cached in [0, 1] {
        let mut root = Node::column().child(Node::image(src, ImageFit::Cover).frame_offset(Some(1500)));
        let report = resolver.process_images(&mut root, &mut |_| {}).await;
        assert_eq!(report.from_cache, expected_cached);
    }
    assert_eq!(fetcher.requests().len(), 1);
    assert_eq!(resolver.cache().len(), 1);
}

#[tokio::test]
async fn test_relative_paths_load_from_asset_root() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::create_dir_all(dir.path().join("img")).await.unwrap();
    tokio::fs::write(dir.path().join("img/logo.png"), png_bytes(5, 1))
        .await
        .unwrap();

    let policy = SourcePolicy {
        asset_root: Some(dir.path().to_path_buf()),
        ..SourcePolicy::default()
    };
    let mut root = Node::column().child(Node::image("img/logo.png", ImageFit::Contain));
    let report = resolver(Arc::new(StaticFetcher::default()), policy)
        .process_images(&mut root, &mut |_| {})
        .await;

    assert_eq!(report.resolved, 1);
    match &states(&root)[0] {
        ImageState::Ready(image) => assert_eq!(image.width, 5),
        other => panic!("Expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_bytes_are_a_failure() {
    let src = "https://cdn.example.com/not-an-image.png";
    let fetcher = Arc::new(StaticFetcher::default().with(src, b"<html>nope</html>".to_vec()));
    let mut root = Node::column().child(Node::image(src, ImageFit::Cover));

    let report = resolver(fetcher, SourcePolicy::default())
        .process_images(&mut root, &mut |_| {})
        .await;
    assert_eq!(report.failures.len(), 1);
}
