use crate::issue::{Issue, IssueExport};
use crate::{ExportCommand, ExportUpdate, Result};
use mag_assemble::{AssembleOptions, save_pdf};
use mag_render::{PageDescriptor, PreviewPipeline, RenderOptions};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// The most recent export, kept so single pages can be retried
struct LastExport {
    export: IssueExport,
    options: AssembleOptions,
    output_path: PathBuf,
}

struct WorkerState {
    pipeline: PreviewPipeline,
    last_export: Option<LastExport>,
}

/// Async worker task that processes export commands and sends updates.
/// Runs until every command sender is dropped.
pub async fn worker_task(
    pipeline: PreviewPipeline,
    mut command_rx: mpsc::UnboundedReceiver<ExportCommand>,
    update_tx: mpsc::UnboundedSender<ExportUpdate>,
) {
    let mut state = WorkerState {
        pipeline,
        last_export: None,
    };

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut state, &mut command_rx, &update_tx).await;
    }
    log::debug!("Export worker stopped");
}

async fn process_command(
    cmd: ExportCommand,
    state: &mut WorkerState,
    command_rx: &mut mpsc::UnboundedReceiver<ExportCommand>,
    update_tx: &mpsc::UnboundedSender<ExportUpdate>,
) {
    match cmd {
        ExportCommand::RenderPreview {
            mut request_id,
            mut page,
            mut options,
        } => {
            // Drain any queued previews, keeping only the most recent
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let ExportCommand::RenderPreview {
                    request_id: new_id,
                    page: new_page,
                    options: new_options,
                } = next_cmd
                {
                    log::debug!("Discarding preview {}, using newer request {}", request_id, new_id);
                    request_id = new_id;
                    page = new_page;
                    options = new_options;
                } else {
                    // Can't put it back, so run it before the preview
                    Box::pin(process_command(next_cmd, state, command_rx, update_tx)).await;
                }
            }

            handle_preview(request_id, page, options, &state.pipeline, update_tx).await;
        }
        ExportCommand::ExportIssue {
            issue,
            options,
            output_path,
        } => {
            handle_export(issue, options, output_path, state, update_tx).await;
        }
        ExportCommand::RetryPage { page_number } => {
            handle_retry(page_number, state, update_tx).await;
        }
        ExportCommand::SaveConfig { path } => match state.pipeline.config().save(&path).await {
            Ok(()) => {
                let _ = update_tx.send(ExportUpdate::ConfigSaved { path });
            }
            Err(e) => {
                let _ = update_tx.send(ExportUpdate::Error {
                    message: format!("Failed to save config: {e}"),
                });
            }
        },
    }
}

async fn handle_preview(
    request_id: u64,
    page: PageDescriptor,
    options: RenderOptions,
    pipeline: &PreviewPipeline,
    update_tx: &mpsc::UnboundedSender<ExportUpdate>,
) {
    let tx = update_tx.clone();
    let result = pipeline
        .render_page(&page, &options, &mut |progress: mag_render::RenderProgress| {
            let _ = tx.send(ExportUpdate::Progress {
                operation: progress.label(),
                current: 0,
                total: 0,
            });
        })
        .await;

    match result {
        Ok(preview) => {
            let _ = update_tx.send(ExportUpdate::PreviewRendered {
                request_id,
                preview,
            });
        }
        Err(e) => {
            let _ = update_tx.send(ExportUpdate::PageFailed {
                page_number: options.page_number,
                message: e.to_string(),
            });
        }
    }
}

async fn handle_export(
    issue: Issue,
    options: AssembleOptions,
    output_path: PathBuf,
    state: &mut WorkerState,
    update_tx: &mpsc::UnboundedSender<ExportUpdate>,
) {
    let mut export = IssueExport::new(state.pipeline.clone(), issue);
    export.render_all(update_tx).await;

    let last = LastExport {
        export,
        options,
        output_path,
    };
    if let Err(e) = write_export(&last, update_tx).await {
        let _ = update_tx.send(ExportUpdate::Error {
            message: format!("Failed to export issue: {e}"),
        });
    }
    state.last_export = Some(last);
}

async fn handle_retry(
    page_number: u32,
    state: &mut WorkerState,
    update_tx: &mpsc::UnboundedSender<ExportUpdate>,
) {
    let Some(last) = state.last_export.as_mut() else {
        let _ = update_tx.send(ExportUpdate::Error {
            message: "No export to retry; export the issue first".to_string(),
        });
        return;
    };

    let retried = match last.export.retry_page(page_number, update_tx).await {
        Ok(succeeded) => succeeded,
        Err(e) => {
            let _ = update_tx.send(ExportUpdate::Error {
                message: format!("Failed to retry page {page_number}: {e}"),
            });
            return;
        }
    };

    if !retried {
        // PageFailed was already sent; keep the previous PDF
        return;
    }
    if let Err(e) = write_export(last, update_tx).await {
        let _ = update_tx.send(ExportUpdate::Error {
            message: format!("Failed to export issue: {e}"),
        });
    }
}

async fn write_export(last: &LastExport, update_tx: &mpsc::UnboundedSender<ExportUpdate>) -> Result<()> {
    let document = last
        .export
        .assemble(last.options.clone(), update_tx)
        .await?;
    save_pdf(&document.bytes, &last.output_path).await?;

    log::info!(
        "Exported {} page(s) to {}",
        document.page_count,
        last.output_path.display()
    );
    let _ = update_tx.send(ExportUpdate::IssueExported {
        path: last.output_path.clone(),
        page_count: document.page_count,
        warnings: document.warnings,
    });
    Ok(())
}
