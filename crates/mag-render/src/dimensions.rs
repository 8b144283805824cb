//! Physical page settings → pixel render dimensions

use crate::constants::{MAX_PAGE_DIMENSION_PX, mm_to_px, round_half_up};
use crate::types::*;

/// Compute the integer pixel size of a page and its margin.
///
/// Pure and deterministic: presets map to their canonical size, custom pages
/// convert their millimetre size at 96 px/inch, rounding half-up.
pub fn compute_dimensions(settings: &PdfSettings) -> Result<RenderDimensions> {
    let (width_mm, height_mm) = page_size_mm(settings)?;

    let margin_mm = settings.margin_mm;
    if !margin_mm.is_finite() || margin_mm < 0.0 {
        return Err(RenderError::InvalidDimension(format!(
            "margin must be a non-negative number of millimetres, got {margin_mm}"
        )));
    }

    let render_width = round_half_up(mm_to_px(width_mm));
    let render_height = round_half_up(mm_to_px(height_mm));
    let margin_px = round_half_up(mm_to_px(margin_mm));

    if render_width > MAX_PAGE_DIMENSION_PX || render_height > MAX_PAGE_DIMENSION_PX {
        return Err(RenderError::InvalidDimension(format!(
            "page of {width_mm}x{height_mm}mm exceeds the {MAX_PAGE_DIMENSION_PX}px limit per side"
        )));
    }

    if render_width == 0 || render_height == 0 {
        return Err(RenderError::InvalidDimension(format!(
            "page of {width_mm}x{height_mm}mm is smaller than one pixel"
        )));
    }

    let both_margins = u64::from(margin_px) * 2;
    if both_margins >= u64::from(render_width) || both_margins >= u64::from(render_height) {
        return Err(RenderError::InvalidDimension(format!(
            "margin of {margin_mm}mm leaves no content area on a {render_width}x{render_height}px page"
        )));
    }

    Ok(RenderDimensions {
        render_width,
        render_height,
        margin_px,
    })
}

/// Physical page size in millimetres for the selected ratio
pub fn page_size_mm(settings: &PdfSettings) -> Result<(f64, f64)> {
    if let Some(size) = settings.ratio_type.canonical_mm() {
        return Ok(size);
    }

    match (settings.custom_width_mm, settings.custom_height_mm) {
        (Some(w), Some(h)) if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 => Ok((w, h)),
        (Some(w), Some(h)) => Err(RenderError::InvalidDimension(format!(
            "custom page size must be positive, got {w}x{h}mm"
        ))),
        _ => Err(RenderError::InvalidDimension(
            "custom ratio requires customWidthMm and customHeightMm".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_larger_than_half_page_is_rejected() {
        let mut settings = PdfSettings::custom(20.0, 20.0);
        settings.margin_mm = 10.0;
        assert!(matches!(
            compute_dimensions(&settings),
            Err(RenderError::InvalidDimension(_))
        ));
    }

    #[test]
    fn negative_margin_is_rejected() {
        let mut settings = PdfSettings::default();
        settings.margin_mm = -1.0;
        assert!(compute_dimensions(&settings).is_err());
    }

    #[test]
    fn oversized_page_is_rejected_before_any_bitmap_exists() {
        match compute_dimensions(&PdfSettings::custom(100_000.0, 100_000.0)) {
            Err(RenderError::InvalidDimension(msg)) => assert!(msg.contains("limit")),
            other => panic!("Expected InvalidDimension, got {:?}", other),
        }
    }
}
