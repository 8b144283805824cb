use mag_render::constants::{mm_to_px, round_half_up};
use mag_render::*;

#[test]
fn test_a4_portrait_with_margin() {
    let mut settings = PdfSettings::with_ratio(RatioType::A4Portrait);
    settings.margin_mm = 10.0;

    let dims = compute_dimensions(&settings).unwrap();
    assert_eq!(dims.render_width, 793);
    assert_eq!(dims.render_height, 1123);
    assert_eq!(dims.margin_px, 38);
}

#[test]
fn test_presets_round_trip_through_millimetres() {
    for ratio in [
        RatioType::Letter,
        RatioType::A4Portrait,
        RatioType::A4Landscape,
        RatioType::Widescreen,
        RatioType::Standard,
        RatioType::Square,
    ] {
        let (width_mm, height_mm) = ratio.canonical_mm().unwrap();
        let dims = compute_dimensions(&PdfSettings::with_ratio(ratio)).unwrap();
        assert_eq!(dims.render_width, round_half_up(mm_to_px(width_mm)), "{}", ratio.as_str());
        assert_eq!(dims.render_height, round_half_up(mm_to_px(height_mm)), "{}", ratio.as_str());
        assert_eq!(Some((dims.render_width, dims.render_height)), ratio.canonical_px());
    }
}

#[test]
fn test_custom_size_converts_and_rounds_half_up() {
    // 100mm = 377.95px, 50.8mm = 192px exactly
    let dims = compute_dimensions(&PdfSettings::custom(100.0, 50.8)).unwrap();
    assert_eq!(dims.render_width, 378);
    assert_eq!(dims.render_height, 192);
    assert_eq!(dims.margin_px, 0);
}

#[test]
fn test_custom_width_zero_is_invalid() {
    let result = compute_dimensions(&PdfSettings::custom(0.0, 297.0));
    assert!(matches!(result, Err(RenderError::InvalidDimension(_))));
}

#[test]
fn test_custom_without_size_is_invalid() {
    let settings = PdfSettings::with_ratio(RatioType::Custom);
    match compute_dimensions(&settings) {
        Err(RenderError::InvalidDimension(msg)) => assert!(msg.contains("customWidthMm")),
        other => panic!("Expected InvalidDimension, got {:?}", other),
    }
}

#[test]
fn test_settings_deserialize_from_editor_json() {
    let json = r##"{
        "ratioType": "custom",
        "customWidthMm": 148,
        "customHeightMm": 210,
        "marginMm": 5,
        "backgroundColor": "#fafafa",
        "footerSettings": {
            "enabled": true,
            "pageNumberFormat": "page-n-of-total",
            "pageNumber": { "color": "#111827", "align": "right" },
            "title": { "color": "#6b7280", "align": "left" }
        }
    }"##;
    let settings: PdfSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.ratio_type, RatioType::Custom);
    assert_eq!(settings.footer_settings.page_number_format, PageNumberFormat::PageNOfTotal);
    assert_eq!(
        settings.footer_settings.title.as_ref().map(|g| g.align),
        Some(Alignment::Left)
    );

    let dims = compute_dimensions(&settings).unwrap();
    assert_eq!((dims.render_width, dims.render_height, dims.margin_px), (559, 794, 19));
}

#[test]
fn test_page_number_formats() {
    assert_eq!(PageNumberFormat::Number.format(3, Some(12)), "3");
    assert_eq!(PageNumberFormat::PageN.format(3, Some(12)), "Page 3");
    assert_eq!(PageNumberFormat::NOfTotal.format(3, Some(12)), "3 / 12");
    assert_eq!(PageNumberFormat::PageNOfTotal.format(3, Some(12)), "Page 3 of 12");
    assert_eq!(PageNumberFormat::Padded.format(3, None), "03");
    // No total known for a single page render
    assert_eq!(PageNumberFormat::NOfTotal.format(3, None), "3");
}

#[test]
fn test_enormous_margin_is_invalid_not_a_panic() {
    let mut settings = PdfSettings::default();
    settings.margin_mm = 1.0e12;
    match compute_dimensions(&settings) {
        Err(RenderError::InvalidDimension(msg)) => assert!(msg.contains("margin")),
        other => panic!("Expected InvalidDimension, got {:?}", other),
    }
}

#[test]
fn test_page_side_limit() {
    let side_mm = constants::px_to_mm(constants::MAX_PAGE_DIMENSION_PX as f64);
    assert!(compute_dimensions(&PdfSettings::custom(side_mm, 100.0)).is_ok());

    let result = compute_dimensions(&PdfSettings::custom(side_mm + 1.0, 100.0));
    assert!(matches!(result, Err(RenderError::InvalidDimension(_))));
}
