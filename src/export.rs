//! PNG export of a finished scene.
//!
//! Encoder settings are fixed: best compression, no row filtering and
//! straight (non-premultiplied) RGBA. No file I/O happens here.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::Result;
use crate::fonts::FontRegistry;
use crate::scene::Scene;
use crate::scene::svg::rasterize;

/// Encodes `image` as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::NoFilter).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

/// Rasterizes `scene` at `scale` and encodes the result.
pub fn export_png(scene: &Scene, scale: f32, fonts: &FontRegistry) -> Result<Vec<u8>> {
    let image = rasterize(scene, scale, fonts)?;
    log::debug!("encoding {}x{} PNG", image.width(), image.height());
    encode_png(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CanvasSize;
    use crate::scene::{Color, LayerKind, Paint, RectNode};

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn white_scene() -> Scene {
        let mut scene = Scene::new(CanvasSize { width: 336, height: 192 });
        scene.push(
            LayerKind::Background,
            None,
            RectNode::new(0.0, 0.0, 336.0, 192.0, Paint::fill(Color::WHITE)),
        );
        scene
    }

    #[test]
    fn export_scales_dimensions() {
        let bytes = export_png(&white_scene(), 3.0, &FontRegistry::empty()).unwrap();
        assert_eq!(bytes[..8], PNG_SIGNATURE);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1008, 576));
    }

    #[test]
    fn export_is_deterministic() {
        let fonts = FontRegistry::empty();
        let a = export_png(&white_scene(), 1.0, &fonts).unwrap();
        let b = export_png(&white_scene(), 1.0, &fonts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn alpha_is_preserved_unpremultiplied() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 128]));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1).0, [200, 100, 50, 128]);
    }
}
