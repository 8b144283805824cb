use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("No pages to assemble")]
    EmptyDocument,
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AssembleError>;

/// A page or link that was left out of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyWarning {
    pub page_number: u32,
    pub reason: String,
}

impl AssemblyWarning {
    pub(crate) fn new(page_number: u32, reason: impl Into<String>) -> Self {
        Self {
            page_number,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {}: {}", self.page_number, self.reason)
    }
}

/// Phases reported while a document is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyProgress {
    /// `index` is 1-based over the sorted input
    LoadingPage {
        index: usize,
        total: usize,
        page_number: u32,
    },
    EmbeddingLinks,
    Finalizing,
}

impl AssemblyProgress {
    pub fn label(&self) -> String {
        match self {
            AssemblyProgress::LoadingPage { index, total, .. } => {
                format!("Adding page {index} of {total}")
            }
            AssemblyProgress::EmbeddingLinks => "Adding table of contents links".to_string(),
            AssemblyProgress::Finalizing => "Finalizing PDF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub link_count: usize,
    pub warnings: Vec<AssemblyWarning>,
}
