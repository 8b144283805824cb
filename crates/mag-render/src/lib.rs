pub mod capture;
pub mod components;
pub mod constants;
mod dimensions;
pub mod images;
mod options;
mod pipeline;
pub mod scene;
pub mod surface;
mod types;

pub use capture::{Capture, capture};
pub use components::{LayoutRegistry, PageLayout, PageType, RenderHandle, mount};
pub use dimensions::{compute_dimensions, page_size_mm};
pub use images::{ImageReport, ImageResolver};
pub use options::RenderConfig;
pub use pipeline::PreviewPipeline;
pub use surface::{OffscreenSurface, SurfaceHost};
pub use types::*;
