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

/// Queue every command up front, then run the worker until the queue closes
async fn run_worker(commands: Vec<ExportCommand>) -> Vec<ExportUpdate> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    for cmd in commands {
        command_tx.send(cmd).unwrap();
    }
    drop(command_tx);

    worker_task(pipeline(), command_rx, update_tx).await;

    let mut updates = Vec::new();
    while let Ok(update) = update_rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn preview(request_id: u64, quote: &str) -> ExportCommand {
    ExportCommand::RenderPreview {
        request_id,
        page: PageDescriptor::new("quote", json!({ "quote": quote })),
        options: RenderOptions::default(),
    }
}

#[tokio::test]
async fn test_queued_previews_collapse_to_newest() {
    let updates = run_worker(vec![preview(1, "a"), preview(2, "b"), preview(3, "c")]).await;

    let rendered: Vec<u64> = updates
        .iter()
        .filter_map(|u| match u {
            ExportUpdate::PreviewRendered { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .collect();
    assert_eq!(rendered, vec![3]);
}

#[tokio::test]
async fn test_non_preview_command_is_not_dropped_while_coalescing() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("render.json");

    let updates = run_worker(vec![
        preview(1, "a"),
        ExportCommand::SaveConfig {
            path: config_path.clone(),
        },
        preview(2, "b"),
    ])
    .await;

    assert!(updates
        .iter()
        .any(|u| matches!(u, ExportUpdate::ConfigSaved { path } if *path == config_path)));
    let saved = RenderConfig::load(&config_path).await.unwrap();
    assert_eq!(saved.supersample_scale, 1.0);
}

#[tokio::test]
async fn test_export_writes_pdf_and_retry_rewrites_it() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("issue.pdf");
    let issue = Issue {
        title: Some("Autumn".to_string()),
        site_url: None,
        pages: vec![
            PageDescriptor::new("cover", json!({ "title": "Autumn" })),
            PageDescriptor::new("hologram", json!({})),
        ],
    };

    let updates = run_worker(vec![
        ExportCommand::ExportIssue {
            issue,
            options: AssembleOptions::default(),
            output_path: output_path.clone(),
        },
        ExportCommand::RetryPage { page_number: 2 },
    ])
    .await;

    let failed: Vec<u32> = updates
        .iter()
        .filter_map(|u| match u {
            ExportUpdate::PageFailed { page_number, .. } => Some(*page_number),
            _ => None,
        })
        .collect();
    // Once on export, once more on the retry
    assert_eq!(failed, vec![2, 2]);

    let exported: Vec<(usize, usize)> = updates
        .iter()
        .filter_map(|u| match u {
            ExportUpdate::IssueExported {
                page_count,
                warnings,
                ..
            } => Some((*page_count, warnings.len())),
            _ => None,
        })
        .collect();
    assert_eq!(exported, vec![(1, 1)]);

    let bytes = tokio::fs::read(&output_path).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_retry_without_export_reports_error() {
    let updates = run_worker(vec![ExportCommand::RetryPage { page_number: 1 }]).await;
    assert!(matches!(
        updates.as_slice(),
        [ExportUpdate::Error { message }] if message.contains("export the issue first")
    ));
}
