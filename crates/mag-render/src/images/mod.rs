//! Image source resolution
//!
//! Before capture every image in the mounted tree is loaded and inlined as
//! decoded-size-checked bytes, so rasterization never reads from an unresolved
//! source. Sources are handled by kind:
//!
//! - `data:` URIs decode in place
//! - `http(s)` sources on a configured cross-origin storage host go through
//!   the same-origin proxy when one is configured
//! - other `http(s)` sources are fetched directly
//! - anything else is a file path, relative to the asset root
//!
//! A failing image becomes a placeholder and the batch carries on.

mod cache;
mod fetch;

pub use cache::{FrameCache, FrameKey, LruFrameCache};
pub use fetch::{Fetched, HttpFetcher, ImageFetcher, OfflineFetcher, proxied_url};

use crate::options::RenderConfig;
use crate::scene::{ImageBox, ImageState, Node, ResolvedImage};
use crate::types::*;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where image sources are allowed to come from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePolicy {
    pub proxy_endpoint: Option<String>,
    pub cross_origin_hosts: Vec<String>,
    pub asset_root: Option<PathBuf>,
}

impl SourcePolicy {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            proxy_endpoint: config.proxy_endpoint.clone(),
            cross_origin_hosts: config.cross_origin_hosts.clone(),
            asset_root: config.asset_root.clone(),
        }
    }

    fn is_cross_origin(&self, url: &url::Url) -> bool {
        url.host_str().is_some_and(|host| {
            self.cross_origin_hosts
                .iter()
                .any(|h| host == h || host.ends_with(&format!(".{h}")))
        })
    }
}

/// One image that could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFailure {
    pub src: String,
    pub reason: String,
}

impl From<ImageFailure> for RenderError {
    fn from(failure: ImageFailure) -> Self {
        RenderError::ImageResolution {
            src: failure.src,
            reason: failure.reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageReport {
    pub total: usize,
    pub resolved: usize,
    pub from_cache: usize,
    pub failures: Vec<ImageFailure>,
}

pub struct ImageResolver {
    fetcher: Arc<dyn ImageFetcher>,
    cache: Arc<dyn FrameCache>,
    policy: SourcePolicy,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("policy", &self.policy)
            .field("cached_frames", &self.cache.len())
            .finish()
    }
}

impl ImageResolver {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, cache: Arc<dyn FrameCache>, policy: SourcePolicy) -> Self {
        Self {
            fetcher,
            cache,
            policy,
        }
    }

    /// Resolver with an HTTP fetcher and an LRU cache sized from `config`
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HttpFetcher::new(config.fetch_timeout())?),
            Arc::new(LruFrameCache::new(config.frame_cache_capacity)),
            SourcePolicy::from_config(config),
        ))
    }

    pub fn cache(&self) -> &Arc<dyn FrameCache> {
        &self.cache
    }

    /// Resolve and inline every pending image under `root`
    pub async fn process_images(
        &self,
        root: &mut Node,
        on_progress: &mut (dyn FnMut(RenderProgress) + Send),
    ) -> ImageReport {
        let mut images = root.images_mut();
        images.retain(|image| image.state == ImageState::Pending);

        let mut report = ImageReport {
            total: images.len(),
            ..ImageReport::default()
        };

        for (index, image) in images.into_iter().enumerate() {
            match self.resolve(image).await {
                Ok(cached) => {
                    report.resolved += 1;
                    if cached {
                        report.from_cache += 1;
                    }
                }
                Err(reason) => {
                    log::warn!("Image {} left as placeholder: {}", abbreviate(&image.src), reason);
                    image.state = ImageState::Placeholder {
                        reason: reason.clone(),
                    };
                    report.failures.push(ImageFailure {
                        src: image.src.clone(),
                        reason,
                    });
                }
            }
            on_progress(RenderProgress::Image {
                done: index + 1,
                total: report.total,
            });
        }

        log::debug!(
            "Resolved {}/{} images ({} from cache, {} failed)",
            report.resolved,
            report.total,
            report.from_cache,
            report.failures.len()
        );
        report
    }

    /// Resolve one image in place. Returns whether the frame came from cache.
    async fn resolve(&self, image: &mut ImageBox) -> std::result::Result<bool, String> {
        let src = image.src.trim().to_string();
        if src.is_empty() {
            return Err("empty image source".to_string());
        }

        let key = FrameKey::new(src.clone(), image.frame_offset_ms);
        if let Some(resolved) = self.cache.get(&key) {
            inline(image, resolved);
            return Ok(true);
        }

        let (bytes, declared_mime) = self.load(&src).await?;
        let resolved = Arc::new(decode(bytes, declared_mime).await?);

        // Inline payloads are already self-contained; caching them only costs memory
        if !src.starts_with("data:") {
            self.cache.insert(key, Arc::clone(&resolved));
        }
        inline(image, resolved);
        Ok(false)
    }

    async fn load(&self, src: &str) -> std::result::Result<(Vec<u8>, Option<String>), String> {
        if src.starts_with("data:") {
            let (mime, bytes) = parse_data_uri(src).ok_or("malformed data URI")?;
            return Ok((bytes, Some(mime)));
        }

        if let Ok(url) = url::Url::parse(src) {
            match url.scheme() {
                "http" | "https" => {
                    let target = match &self.policy.proxy_endpoint {
                        Some(endpoint) if self.policy.is_cross_origin(&url) => {
                            proxied_url(endpoint, src)?
                        }
                        _ => src.to_string(),
                    };
                    let fetched = self.fetcher.fetch(&target).await?;
                    return Ok((fetched.bytes, fetched.content_type));
                }
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| format!("invalid file URL {src}"))?;
                    return read_file(&path).await;
                }
                // Windows drive letters parse as single-letter schemes
                scheme if scheme.len() > 1 => {
                    return Err(format!("unsupported image scheme '{scheme}'"));
                }
                _ => {}
            }
        }

        let path = Path::new(src);
        let path = match &self.policy.asset_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        read_file(&path).await
    }
}

async fn read_file(path: &Path) -> std::result::Result<(Vec<u8>, Option<String>), String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    Ok((bytes, None))
}

/// Decode to validate the payload and learn its intrinsic size
async fn decode(
    bytes: Vec<u8>,
    declared_mime: Option<String>,
) -> std::result::Result<ResolvedImage, String> {
    tokio::task::spawn_blocking(move || {
        let format = image::guess_format(&bytes).map_err(|e| format!("unrecognized image data: {e}"))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| format!("failed to decode image: {e}"))?;
        let mime = format.to_mime_type().to_string();
        if let Some(declared) = declared_mime.filter(|d| !d.starts_with(&mime)) {
            log::debug!("Declared type {declared} differs from sniffed {mime}");
        }
        Ok(ResolvedImage {
            mime,
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    })
    .await
    .map_err(|e| format!("decode task failed: {e}"))?
}

fn inline(image: &mut ImageBox, resolved: Arc<ResolvedImage>) {
    if !image.src.starts_with("data:") {
        image.src = to_data_uri(&resolved.mime, &resolved.bytes);
    }
    image.state = ImageState::Ready(resolved);
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a data URI into its MIME type and payload bytes
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        payload.as_bytes().to_vec()
    };
    Some((mime, data))
}

fn abbreviate(src: &str) -> String {
    if src.len() <= 80 {
        return src.to_string();
    }
    let cut = (0..=80).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
    format!("{}…", &src[..cut])
}
