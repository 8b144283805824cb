//! Page bitmap embedding
//!
//! Captured pages arrive as PNG data URIs with an alpha channel. PDF image
//! XObjects carry no alpha here, so pixels are flattened onto white and
//! re-encoded as baseline JPEG for `/DCTDecode`.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use mag_render::images::parse_data_uri;

/// A page bitmap ready to be written as an image XObject
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedImage {
    pub jpeg: Vec<u8>,
    /// Bitmap pixels, which may exceed the logical page size when supersampled
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Decode a captured page and re-encode it for embedding.
/// Errors are returned as a reason string for the assembly warning.
pub(crate) fn prepare_page_image(
    data_uri: &str,
    quality: u8,
) -> std::result::Result<EmbeddedImage, String> {
    let (_, bytes) = parse_data_uri(data_uri).ok_or_else(|| "bitmap is not a data URI".to_string())?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| format!("bitmap could not be decoded: {}", e))?;

    let (pixel_width, pixel_height) = (decoded.width(), decoded.height());
    if pixel_width == 0 || pixel_height == 0 {
        return Err("bitmap is empty".to_string());
    }

    let rgba = decoded.to_rgba8();
    let flattened = RgbImage::from_fn(pixel_width, pixel_height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let over_white = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    });

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&flattened)
        .map_err(|e| format!("bitmap could not be encoded: {}", e))?;

    Ok(EmbeddedImage {
        jpeg,
        pixel_width,
        pixel_height,
    })
}

/// Add an image XObject holding the page bitmap
pub(crate) fn create_image_xobject(output: &mut Document, image: EmbeddedImage) -> ObjectId {
    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Image".to_vec()));
    xobject_dict.set("Width", Object::Integer(image.pixel_width as i64));
    xobject_dict.set("Height", Object::Integer(image.pixel_height as i64));
    xobject_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    xobject_dict.set("BitsPerComponent", Object::Integer(8));
    xobject_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    // Already compressed; keep lopdf from deflating it again
    output.add_object(Stream::new(xobject_dict, image.jpeg).with_compression(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mag_render::images::to_data_uri;
    use std::io::Cursor;

    fn png_uri(width: u32, height: u32, pixel: [u8; 4]) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        to_data_uri("image/png", &bytes)
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let prepared = prepare_page_image(&png_uri(6, 4, [0, 0, 0, 0]), 90).unwrap();
        assert_eq!((prepared.pixel_width, prepared.pixel_height), (6, 4));

        let decoded = image::load_from_memory(&prepared.jpeg).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(3, 2).0;
        assert!(r > 245 && g > 245 && b > 245);
    }

    #[test]
    fn test_non_data_uri_is_rejected() {
        let reason = prepare_page_image("https://example.com/page.png", 90).unwrap_err();
        assert!(reason.contains("data URI"));
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        let uri = to_data_uri("image/png", b"not a png");
        let reason = prepare_page_image(&uri, 90).unwrap_err();
        assert!(reason.contains("decoded"));
    }
}
