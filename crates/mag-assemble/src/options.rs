use crate::types::{AssembleError, Result};

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

pub const DEFAULT_PRODUCER: &str = concat!("mag-assemble ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct AssembleOptions {
    /// Written to the document info dictionary when set
    pub title: Option<String>,
    pub producer: String,
    /// 1..=100
    pub jpeg_quality: u8,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            title: None,
            producer: DEFAULT_PRODUCER.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl AssembleOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AssembleError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
