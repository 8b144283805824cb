use crate::constants::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline configuration shared by every page render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    // Rasterization
    pub supersample_scale: f32,

    // Settle delays
    pub render_settle_ms: u64,
    pub image_settle_ms: u64,

    // Image sources
    /// Same-origin endpoint that streams back the bytes of `?url=<source>`
    pub proxy_endpoint: Option<String>,
    /// Storage hosts whose images must go through the proxy
    pub cross_origin_hosts: Vec<String>,
    /// Base directory for relative image paths
    pub asset_root: Option<PathBuf>,
    pub fetch_timeout_ms: u64,
    pub frame_cache_capacity: usize,

    // Fonts
    pub font_dirs: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            supersample_scale: DEFAULT_SUPERSAMPLE_SCALE,
            render_settle_ms: DEFAULT_RENDER_SETTLE_MS,
            image_settle_ms: DEFAULT_IMAGE_SETTLE_MS,
            proxy_endpoint: None,
            cross_origin_hosts: vec![
                "firebasestorage.googleapis.com".to_string(),
                "storage.googleapis.com".to_string(),
            ],
            asset_root: None,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            frame_cache_capacity: DEFAULT_FRAME_CACHE_CAPACITY,
            font_dirs: vec![
                PathBuf::from("fonts"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu"),
            ],
        }
    }
}

impl RenderConfig {
    /// Load configuration from a JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| RenderError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RenderError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.supersample_scale.is_finite()
            || self.supersample_scale <= 0.0
            || self.supersample_scale > MAX_SUPERSAMPLE_SCALE
        {
            return Err(RenderError::Config(format!(
                "Supersample scale must be in (0, {}], got {}",
                MAX_SUPERSAMPLE_SCALE, self.supersample_scale
            )));
        }

        if self.frame_cache_capacity == 0 {
            return Err(RenderError::Config(
                "Frame cache capacity must be at least 1".to_string(),
            ));
        }

        if let Some(endpoint) = &self.proxy_endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                RenderError::Config(format!("Invalid proxy endpoint '{}': {}", endpoint, e))
            })?;
        }

        Ok(())
    }

    /// Configuration with no settle delays, for callers that drive their own timing
    pub fn without_delays(mut self) -> Self {
        self.render_settle_ms = 0;
        self.image_settle_ms = 0;
        self
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn image_settle(&self) -> Duration {
        Duration::from_millis(self.image_settle_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
