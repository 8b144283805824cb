use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Unknown page type: {0}")]
    UnknownPageType(String),
    #[error("Image resolution failed for {src}: {reason}")]
    ImageResolution { src: String, reason: String },
    #[error("Capture failed: {0}")]
    CaptureFailure(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Page aspect presets offered by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RatioType {
    #[serde(rename = "letter")]
    Letter,
    #[default]
    #[serde(rename = "a4-portrait")]
    A4Portrait,
    #[serde(rename = "a4-landscape")]
    A4Landscape,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "square")]
    Square,
    #[serde(rename = "custom")]
    Custom,
}

impl RatioType {
    /// Pixel size of the preset as laid out by the live preview.
    /// `None` for `Custom`, which carries its own millimetre size.
    pub fn canonical_px(self) -> Option<(u32, u32)> {
        match self {
            RatioType::Letter => Some((816, 1056)),
            RatioType::A4Portrait => Some((793, 1123)),
            RatioType::A4Landscape => Some((1123, 793)),
            RatioType::Widescreen => Some((1280, 720)),
            RatioType::Standard => Some((1024, 768)),
            RatioType::Square => Some((1080, 1080)),
            RatioType::Custom => None,
        }
    }

    /// Canonical physical size in millimetres
    pub fn canonical_mm(self) -> Option<(f64, f64)> {
        self.canonical_px().map(|(w, h)| {
            (
                crate::constants::px_to_mm(w as f64),
                crate::constants::px_to_mm(h as f64),
            )
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatioType::Letter => "letter",
            RatioType::A4Portrait => "a4-portrait",
            RatioType::A4Landscape => "a4-landscape",
            RatioType::Widescreen => "16:9",
            RatioType::Standard => "4:3",
            RatioType::Square => "square",
            RatioType::Custom => "custom",
        }
    }
}

/// Horizontal placement of a footer label group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Display patterns for the footer page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageNumberFormat {
    /// "3"
    #[default]
    #[serde(rename = "n")]
    Number,
    /// "Page 3"
    #[serde(rename = "page-n")]
    PageN,
    /// "3 / 12"
    #[serde(rename = "n-of-total")]
    NOfTotal,
    /// "Page 3 of 12"
    #[serde(rename = "page-n-of-total")]
    PageNOfTotal,
    /// "03"
    #[serde(rename = "padded")]
    Padded,
}

impl PageNumberFormat {
    /// Render a page number. A single page render has no global page count,
    /// so the total-based formats degrade to their plain form without one.
    pub fn format(self, page: u32, total: Option<u32>) -> String {
        match (self, total) {
            (PageNumberFormat::Number, _) => page.to_string(),
            (PageNumberFormat::PageN, _) | (PageNumberFormat::PageNOfTotal, None) => {
                format!("Page {page}")
            }
            (PageNumberFormat::NOfTotal, Some(total)) => format!("{page} / {total}"),
            (PageNumberFormat::NOfTotal, None) => page.to_string(),
            (PageNumberFormat::PageNOfTotal, Some(total)) => format!("Page {page} of {total}"),
            (PageNumberFormat::Padded, _) => format!("{page:02}"),
        }
    }
}

/// Color and alignment of one footer label group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelGroup {
    #[serde(default = "default_label_color")]
    pub color: String,
    #[serde(default)]
    pub align: Alignment,
}

fn default_label_color() -> String {
    "#6b7280".to_string()
}

impl LabelGroup {
    pub fn new(color: impl Into<String>, align: Alignment) -> Self {
        Self {
            color: color.into(),
            align,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FooterSettings {
    pub enabled: bool,
    pub page_number_format: PageNumberFormat,
    pub page_number: Option<LabelGroup>,
    pub title: Option<LabelGroup>,
    pub url: Option<LabelGroup>,
    pub font_size: f32,
}

impl Default for FooterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            page_number_format: PageNumberFormat::Number,
            page_number: Some(LabelGroup::new(default_label_color(), Alignment::Right)),
            title: None,
            url: None,
            font_size: 10.0,
        }
    }
}

/// Physical page settings of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfSettings {
    pub ratio_type: RatioType,
    pub custom_width_mm: Option<f64>,
    pub custom_height_mm: Option<f64>,
    pub margin_mm: f64,
    pub background_color: String,
    pub footer_settings: FooterSettings,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            ratio_type: RatioType::A4Portrait,
            custom_width_mm: None,
            custom_height_mm: None,
            margin_mm: 0.0,
            background_color: "#ffffff".to_string(),
            footer_settings: FooterSettings::default(),
        }
    }
}

impl PdfSettings {
    pub fn with_ratio(ratio_type: RatioType) -> Self {
        Self {
            ratio_type,
            ..Default::default()
        }
    }

    pub fn custom(width_mm: f64, height_mm: f64) -> Self {
        Self {
            ratio_type: RatioType::Custom,
            custom_width_mm: Some(width_mm),
            custom_height_mm: Some(height_mm),
            ..Default::default()
        }
    }
}

/// One page as supplied by the editing layer. Never mutated by rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub page_type: String,
    #[serde(default)]
    pub page_data: serde_json::Value,
    #[serde(default)]
    pub pdf_settings: PdfSettings,
}

impl PageDescriptor {
    pub fn new(page_type: impl Into<String>, page_data: serde_json::Value) -> Self {
        Self {
            page_type: page_type.into(),
            page_data,
            pdf_settings: PdfSettings::default(),
        }
    }

    pub fn with_settings(mut self, pdf_settings: PdfSettings) -> Self {
        self.pdf_settings = pdf_settings;
        self
    }
}

/// Per-call context a single page cannot derive on its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub page_number: u32,
    pub total_pages: Option<u32>,
    pub issue_title: Option<String>,
    pub site_url: Option<String>,
    pub show_footer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_number: 1,
            total_pages: None,
            issue_title: None,
            site_url: None,
            show_footer: true,
        }
    }
}

/// Integer pixel sizes derived from [`PdfSettings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDimensions {
    pub render_width: u32,
    pub render_height: u32,
    pub margin_px: u32,
}

impl RenderDimensions {
    pub fn content_width(&self) -> u32 {
        self.render_width.saturating_sub(self.margin_px.saturating_mul(2))
    }

    pub fn content_height(&self) -> u32 {
        self.render_height.saturating_sub(self.margin_px.saturating_mul(2))
    }
}

/// Bounding box in logical page pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Table-of-contents link: a clickable region and the page it jumps to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub source_region: Region,
    pub destination_page: u32,
}

/// Output of a single-page pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PagePreview {
    /// `data:image/png;base64,...`
    pub encoded_image: String,
    pub width: u32,
    pub height: u32,
    pub links: Vec<TocEntry>,
}

/// A rendered page ready for assembly
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPage {
    /// `None` when the page failed to render
    pub encoded_image: Option<String>,
    pub width: u32,
    pub height: u32,
    pub page_number: u32,
    pub links: Vec<TocEntry>,
}

impl CapturedPage {
    pub fn from_preview(page_number: u32, preview: PagePreview) -> Self {
        Self {
            encoded_image: Some(preview.encoded_image),
            width: preview.width,
            height: preview.height,
            page_number,
            links: preview.links,
        }
    }

    pub fn missing(page_number: u32) -> Self {
        Self {
            encoded_image: None,
            width: 0,
            height: 0,
            page_number,
            links: Vec::new(),
        }
    }
}

/// Ordered phases of a single-page pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderProgress {
    Preparing,
    Rendering,
    ProcessingImages,
    /// Nested inside `ProcessingImages`
    Image { done: usize, total: usize },
    Capturing,
}

impl RenderProgress {
    pub fn label(&self) -> String {
        match self {
            RenderProgress::Preparing => "Preparing page".to_string(),
            RenderProgress::Rendering => "Rendering layout".to_string(),
            RenderProgress::ProcessingImages => "Processing images".to_string(),
            RenderProgress::Image { done, total } => format!("Loaded image {done} of {total}"),
            RenderProgress::Capturing => "Capturing page".to_string(),
        }
    }
}
