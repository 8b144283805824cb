use std::path::PathBuf;
use thiserror::Error;

mod issue;
mod worker;

// Re-export types from library crates
pub use mag_assemble::{AssembleOptions, AssembledDocument, AssemblyWarning};
pub use mag_render::{CapturedPage, PageDescriptor, PagePreview, PreviewPipeline, RenderOptions};

pub use issue::{Issue, IssueExport, PageFailure};
pub use worker::worker_task;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Render(#[from] mag_render::RenderError),
    #[error(transparent)]
    Assemble(#[from] mag_assemble::AssembleError),
    #[error("Page {0} is not part of the issue")]
    UnknownPage(u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse issue: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Commands sent from the front end to the worker
#[derive(Debug)]
pub enum ExportCommand {
    /// Live preview of one page. Queued previews collapse to the newest.
    RenderPreview {
        request_id: u64,
        page: PageDescriptor,
        options: RenderOptions,
    },
    ExportIssue {
        issue: Issue,
        options: AssembleOptions,
        output_path: PathBuf,
    },
    /// Re-render one page of the last export and rewrite its PDF
    RetryPage {
        page_number: u32,
    },
    SaveConfig {
        path: PathBuf,
    },
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum ExportUpdate {
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    PreviewRendered {
        request_id: u64,
        preview: PagePreview,
    },
    PageFailed {
        page_number: u32,
        message: String,
    },
    IssueExported {
        path: PathBuf,
        page_count: usize,
        warnings: Vec<AssemblyWarning>,
    },
    ConfigSaved {
        path: PathBuf,
    },
    Error {
        message: String,
    },
}
