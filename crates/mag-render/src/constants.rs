//! Shared constants for page rendering
//!
//! This module centralizes unit conversions and rendering defaults used
//! throughout the pipeline and by the document assembler.

// =============================================================================
// Unit Conversion
// =============================================================================

/// CSS reference pixel density, fixed for render and assembly alike
pub const PX_PER_INCH: f64 = 96.0;

pub const MM_PER_INCH: f64 = 25.4;

pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert millimeters to CSS pixels
#[inline]
pub fn mm_to_px(mm: f64) -> f64 {
    mm * PX_PER_INCH / MM_PER_INCH
}

/// Convert CSS pixels to millimeters
#[inline]
pub fn px_to_mm(px: f64) -> f64 {
    px * MM_PER_INCH / PX_PER_INCH
}

/// Convert CSS pixels to PDF points
#[inline]
pub fn px_to_pt(px: f64) -> f64 {
    px * POINTS_PER_INCH / PX_PER_INCH
}

/// Round to the nearest integer, halves away from zero.
/// Callers only pass non-negative values.
#[inline]
pub fn round_half_up(value: f64) -> u32 {
    (value + 0.5).floor().max(0.0) as u32
}

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Bitmap resolution multiplier over the logical page size
pub const DEFAULT_SUPERSAMPLE_SCALE: f32 = 2.0;

/// Upper bound for the supersampling scale
pub const MAX_SUPERSAMPLE_SCALE: f32 = 8.0;

/// Largest logical page edge (px), a little over 2.6m at 96 px/inch
pub const MAX_PAGE_DIMENSION_PX: u32 = 10_000;

/// Largest bitmap a capture may allocate, after supersampling (400 MB of RGBA)
pub const MAX_BITMAP_PIXELS: u64 = 100_000_000;

/// Wait after mounting before images are processed (milliseconds)
pub const DEFAULT_RENDER_SETTLE_MS: u64 = 150;

/// Wait after image sources are replaced before capture (milliseconds)
pub const DEFAULT_IMAGE_SETTLE_MS: u64 = 100;

pub const DEFAULT_FRAME_CACHE_CAPACITY: usize = 64;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;

// =============================================================================
// Text
// =============================================================================

/// Line box height as a multiple of the font size
pub const DEFAULT_LINE_HEIGHT: f32 = 1.35;

/// Advance used when no font is loaded or a glyph is missing (em fraction)
pub const FALLBACK_ADVANCE_RATIO: f32 = 0.55;

/// Ascent used when no font is loaded (em fraction)
pub const FALLBACK_ASCENT_RATIO: f32 = 0.8;

/// Page content width the typographic scale was designed against (A4 portrait)
pub const REFERENCE_CONTENT_WIDTH: f32 = 717.0;

pub const REFERENCE_BODY_SIZE: f32 = 16.0;

// =============================================================================
// Placeholders
// =============================================================================

/// Fill for images that could not be resolved
pub const PLACEHOLDER_FILL: (u8, u8, u8) = (229, 231, 235);

pub const PLACEHOLDER_STROKE: (u8, u8, u8) = (156, 163, 175);

/// Aspect ratio (height / width) assumed for images without intrinsic size
pub const PLACEHOLDER_ASPECT: f32 = 0.5625;
