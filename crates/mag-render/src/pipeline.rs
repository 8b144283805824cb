//! Single-page render pipeline
//!
//! dimensions → surface → mount → images → capture → PNG data URI, with
//! progress reported in that order. The surface is destroyed exactly once
//! whichever step fails, and also when the future is dropped mid-run.

use crate::capture::capture;
use crate::components::{LayoutRegistry, mount};
use crate::dimensions::compute_dimensions;
use crate::images::ImageResolver;
use crate::options::RenderConfig;
use crate::scene::{FontBook, Rgba};
use crate::surface::{OffscreenSurface, SurfaceHost};
use crate::types::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PreviewPipeline {
    config: RenderConfig,
    registry: Arc<LayoutRegistry>,
    fonts: Arc<FontBook>,
    resolver: Arc<ImageResolver>,
    host: Arc<SurfaceHost>,
}

impl PreviewPipeline {
    /// Pipeline with the built-in layouts, fonts from the configured
    /// directories and an HTTP image resolver
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let fonts = FontBook::from_dirs(&config.font_dirs);
        if fonts.is_empty() {
            log::warn!("No fonts found in {:?}; text renders as placeholder bars", config.font_dirs);
        }
        let resolver = ImageResolver::from_config(&config)?;
        Ok(Self {
            registry: Arc::new(LayoutRegistry::builtin()),
            fonts: Arc::new(fonts),
            resolver: Arc::new(resolver),
            host: SurfaceHost::new(),
            config,
        })
    }

    pub fn with_registry(mut self, registry: LayoutRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = Arc::new(fonts);
        self
    }

    pub fn with_resolver(mut self, resolver: ImageResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<SurfaceHost> {
        &self.host
    }

    pub fn resolver(&self) -> &Arc<ImageResolver> {
        &self.resolver
    }

    /// Render one page to a PNG data URI
    pub async fn render_page(
        &self,
        descriptor: &PageDescriptor,
        options: &RenderOptions,
        on_progress: &mut (dyn FnMut(RenderProgress) + Send),
    ) -> Result<PagePreview> {
        on_progress(RenderProgress::Preparing);
        let settings = &descriptor.pdf_settings;
        let dimensions = compute_dimensions(settings)?;
        let background = Rgba::parse_or(&settings.background_color, Rgba::WHITE);

        let mut surface = self.host.create(dimensions, background);
        let result = self.run(&mut surface, descriptor, options, on_progress).await;
        surface.destroy();

        if let Err(e) = &result {
            log::warn!(
                "Page {} ({}) failed to render: {}",
                options.page_number,
                descriptor.page_type,
                e
            );
        }
        result
    }

    async fn run(
        &self,
        surface: &mut OffscreenSurface,
        descriptor: &PageDescriptor,
        options: &RenderOptions,
        on_progress: &mut (dyn FnMut(RenderProgress) + Send),
    ) -> Result<PagePreview> {
        on_progress(RenderProgress::Rendering);
        mount(
            surface,
            &self.registry,
            &descriptor.page_type,
            &descriptor.page_data,
            &descriptor.pdf_settings,
            options,
            self.config.render_settle(),
        )
        .await?;

        on_progress(RenderProgress::ProcessingImages);
        let report = self
            .resolver
            .process_images(surface.root_mut(), on_progress)
            .await;
        if report.total > 0 && !self.config.image_settle().is_zero() {
            tokio::time::sleep(self.config.image_settle()).await;
        }

        on_progress(RenderProgress::Capturing);
        let capture = capture(surface, Arc::clone(&self.fonts), self.config.supersample_scale).await?;
        let encoded_image = capture.to_data_uri()?;

        Ok(PagePreview {
            encoded_image,
            width: capture.width,
            height: capture.height,
            links: capture.links,
        })
    }
}
