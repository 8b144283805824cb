//! Whole-issue export: render every page in order, keep failures
//! retryable one page at a time, then assemble the PDF.

use crate::{ExportUpdate, Result, RuntimeError};
use mag_assemble::{AssembleOptions, AssembledDocument, assemble_async};
use mag_render::{CapturedPage, PageDescriptor, PreviewPipeline, RenderOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;

/// An issue file as saved by the editor. Page numbers follow list order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Issue {
    pub title: Option<String>,
    pub site_url: Option<String>,
    pub pages: Vec<PageDescriptor>,
}

impl Issue {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Per-page context for page `page_number` (1-based)
    pub fn render_options(&self, page_number: u32) -> RenderOptions {
        RenderOptions {
            page_number,
            total_pages: Some(self.page_count()),
            issue_title: self.title.clone(),
            site_url: self.site_url.clone(),
            show_footer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page_number: u32,
    pub message: String,
}

pub struct IssueExport {
    pipeline: PreviewPipeline,
    issue: Issue,
    captured: Vec<CapturedPage>,
    failures: Vec<PageFailure>,
}

impl IssueExport {
    pub fn new(pipeline: PreviewPipeline, issue: Issue) -> Self {
        Self {
            pipeline,
            issue,
            captured: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn captured(&self) -> &[CapturedPage] {
        &self.captured
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    /// Replace a page's descriptor before retrying it
    pub fn update_page(&mut self, page_number: u32, page: PageDescriptor) -> Result<()> {
        let slot = page_number
            .checked_sub(1)
            .and_then(|idx| self.issue.pages.get_mut(idx as usize))
            .ok_or(RuntimeError::UnknownPage(page_number))?;
        *slot = page;
        Ok(())
    }

    /// Render every page one after another. A failed page becomes a missing
    /// capture plus a failure record; the run carries on.
    pub async fn render_all(&mut self, updates: &mpsc::UnboundedSender<ExportUpdate>) -> &[PageFailure] {
        let total = self.issue.pages.len();
        self.captured.clear();
        self.failures.clear();

        for idx in 0..total {
            let page_number = idx as u32 + 1;
            let _ = updates.send(ExportUpdate::Progress {
                operation: format!("Rendering page {page_number} of {total}"),
                current: idx,
                total,
            });

            let captured = self.render_one(page_number, updates).await;
            self.captured.push(captured);
        }

        let _ = updates.send(ExportUpdate::Progress {
            operation: "Rendering complete".to_string(),
            current: total,
            total,
        });
        log::info!(
            "Rendered {} page(s), {} failed",
            total,
            self.failures.len()
        );
        &self.failures
    }

    /// Re-render a single page without touching the others
    pub async fn retry_page(
        &mut self,
        page_number: u32,
        updates: &mpsc::UnboundedSender<ExportUpdate>,
    ) -> Result<bool> {
        if page_number == 0 || page_number > self.issue.page_count() {
            return Err(RuntimeError::UnknownPage(page_number));
        }

        self.failures.retain(|f| f.page_number != page_number);
        let captured = self.render_one(page_number, updates).await;
        let succeeded = captured.encoded_image.is_some();

        match self
            .captured
            .iter_mut()
            .find(|c| c.page_number == page_number)
        {
            Some(slot) => *slot = captured,
            None => self.captured.push(captured),
        }
        Ok(succeeded)
    }

    /// Build the PDF from everything captured so far
    pub async fn assemble(
        &self,
        options: AssembleOptions,
        updates: &mpsc::UnboundedSender<ExportUpdate>,
    ) -> Result<AssembledDocument> {
        let options = match (&options.title, &self.issue.title) {
            (None, Some(title)) => options.with_title(title.clone()),
            _ => options,
        };

        let tx = updates.clone();
        let document = assemble_async(self.captured.clone(), options, move |progress| {
            let (current, total) = match progress {
                mag_assemble::AssemblyProgress::LoadingPage { index, total, .. } => (index, total),
                _ => (0, 0),
            };
            let _ = tx.send(ExportUpdate::Progress {
                operation: progress.label(),
                current,
                total,
            });
        })
        .await?;

        for warning in &document.warnings {
            log::warn!("Assembly warning: {}", warning);
        }
        Ok(document)
    }

    async fn render_one(
        &mut self,
        page_number: u32,
        updates: &mpsc::UnboundedSender<ExportUpdate>,
    ) -> CapturedPage {
        let Some(descriptor) = page_number
            .checked_sub(1)
            .and_then(|idx| self.issue.pages.get(idx as usize))
        else {
            return CapturedPage::missing(page_number);
        };
        let options = self.issue.render_options(page_number);

        let tx = updates.clone();
        let result = self
            .pipeline
            .render_page(descriptor, &options, &mut |progress: mag_render::RenderProgress| {
                log::debug!("Page {}: {}", page_number, progress.label());
                if let mag_render::RenderProgress::Image { done, total } = progress {
                    let _ = tx.send(ExportUpdate::Progress {
                        operation: format!("Page {page_number}: {}", progress.label()),
                        current: done,
                        total,
                    });
                }
            })
            .await;

        match result {
            Ok(preview) => CapturedPage::from_preview(page_number, preview),
            Err(e) => {
                let message = e.to_string();
                let _ = updates.send(ExportUpdate::PageFailed {
                    page_number,
                    message: message.clone(),
                });
                self.failures.push(PageFailure {
                    page_number,
                    message,
                });
                CapturedPage::missing(page_number)
            }
        }
    }
}
