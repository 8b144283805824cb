use lopdf::Document;
use mag_async_runtime::*;
use mag_render::images::{ImageResolver, LruFrameCache, OfflineFetcher, SourcePolicy};
use mag_render::scene::FontBook;
use mag_render::RenderConfig;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

fn pipeline() -> PreviewPipeline {
    let config = RenderConfig {
        font_dirs: vec![],
        supersample_scale: 1.0,
        ..RenderConfig::default()
    }
    .without_delays();
    PreviewPipeline::new(config)
        .unwrap()
        .with_fonts(FontBook::new())
        .with_resolver(ImageResolver::new(
            Arc::new(OfflineFetcher),
            Arc::new(LruFrameCache::new(4)),
            SourcePolicy::default(),
        ))
}

fn issue_with_broken_second_page() -> Issue {
    Issue {
        title: Some("Spring Issue".to_string()),
        site_url: None,
        pages: vec![
            PageDescriptor::new(
                "table-of-contents",
                json!({ "entries": [{ "title": "Intro", "pageNumber": 3 }] }),
            ),
            PageDescriptor::new("hologram", json!({})),
            PageDescriptor::new("quote", json!({ "quote": "Hello" })),
        ],
    }
}

#[tokio::test]
async fn test_failed_page_is_recorded_and_run_continues() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut export = IssueExport::new(pipeline(), issue_with_broken_second_page());

    let failures = export.render_all(&tx).await.to_vec();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].page_number, 2);

    let captured = export.captured();
    assert_eq!(captured.len(), 3);
    assert!(captured[0].encoded_image.is_some());
    assert!(captured[1].encoded_image.is_none());
    assert!(captured[2].encoded_image.is_some());

    let mut page_failed = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if let ExportUpdate::PageFailed { page_number, .. } = update {
            page_failed.push(page_number);
        }
    }
    assert_eq!(page_failed, vec![2]);

    let document = export.assemble(AssembleOptions::default(), &tx).await.unwrap();
    assert_eq!(document.page_count, 2);
    assert_eq!(document.warnings.len(), 1);
    assert_eq!(document.warnings[0].page_number, 2);
}

#[tokio::test]
async fn test_retry_page_fills_the_gap() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut export = IssueExport::new(pipeline(), issue_with_broken_second_page());
    export.render_all(&tx).await;

    export
        .update_page(2, PageDescriptor::new("editorial", json!({ "title": "Welcome" })))
        .unwrap();
    assert!(export.retry_page(2, &tx).await.unwrap());
    assert!(export.failures().is_empty());
    assert!(export.captured()[1].encoded_image.is_some());

    let document = export.assemble(AssembleOptions::default(), &tx).await.unwrap();
    assert_eq!(document.page_count, 3);
    assert_eq!(document.link_count, 1);
    assert!(document.warnings.is_empty());

    // Issue title falls through to the document info
    let doc = Document::load_mem(&document.bytes).unwrap();
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Spring Issue");
}

#[tokio::test]
async fn test_retry_unknown_page_is_an_error() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut export = IssueExport::new(pipeline(), issue_with_broken_second_page());

    assert!(matches!(
        export.retry_page(0, &tx).await,
        Err(RuntimeError::UnknownPage(0))
    ));
    assert!(matches!(
        export.retry_page(9, &tx).await,
        Err(RuntimeError::UnknownPage(9))
    ));
}

#[tokio::test]
async fn test_issue_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("issue.json");
    tokio::fs::write(
        &path,
        r#"{
            "title": "Winter",
            "siteUrl": "example.org",
            "pages": [
                { "pageType": "cover", "pageData": { "title": "Winter" } },
                { "pageType": "quote", "pageData": { "quote": "Cold" }, "pdfSettings": { "ratioType": "square" } }
            ]
        }"#,
    )
    .await
    .unwrap();

    let issue = Issue::load(&path).await.unwrap();
    assert_eq!(issue.page_count(), 2);
    assert_eq!(issue.pages[1].pdf_settings.ratio_type, mag_render::RatioType::Square);

    let options = issue.render_options(2);
    assert_eq!(options.page_number, 2);
    assert_eq!(options.total_pages, Some(2));
    assert_eq!(options.site_url.as_deref(), Some("example.org"));
}
