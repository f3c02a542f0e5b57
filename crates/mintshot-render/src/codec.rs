//! Screenshot normalization

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

use crate::error::RenderError;

/// Decode any supported image and re-encode it as JPEG
///
/// Transparent areas are composited over white.
pub fn normalize_to_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, RenderError> {
    let decoded = image::load_from_memory(bytes)?;
    let flat = flatten_on_white(&decoded.to_rgba8());

    let mut out = Vec::with_capacity(bytes.len() / 2);
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&flat)?;
    Ok(out)
}

fn flatten_on_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            // (c*a + 255*(255-a)) / 255 stays within u8
            u8::try_from((c * a + 255 * (255 - a)) / 255).unwrap_or(u8::MAX)
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}
