//! Canvas sizing from the aspect-ratio hint element.

use crate::element::{Element, SIGNATURE_NAME_KEY};

/// Logical width of every signature canvas.
pub const BASE_WIDTH: f32 = 336.0;

/// Aspect ratio used when the hint element carries no usable size.
pub const FALLBACK_RATIO: f32 = 7.0 / 4.0;

/// Logical canvas dimensions (before export scaling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Pixel dimensions after scaling by `scale`, never below 1x1.
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        let w = (self.width as f32 * scale).ceil().max(1.0) as u32;
        let h = (self.height as f32 * scale).ceil().max(1.0) as u32;
        (w, h)
    }
}

/// Width / height of the `signatureName` element, when both are positive.
pub fn aspect_ratio(elements: &[Element]) -> Option<f32> {
    let hint = elements.iter().find(|e| e.key == SIGNATURE_NAME_KEY)?;
    let (w, h) = (hint.width?, hint.height?);
    let ratio = w / h;
    (w > 0.0 && h > 0.0 && ratio.is_finite()).then_some(ratio)
}

/// Resolves the canvas for `elements` using the default constants.
pub fn resolve_canvas(elements: &[Element]) -> CanvasSize {
    resolve_canvas_with(elements, BASE_WIDTH, FALLBACK_RATIO)
}

/// Resolves the canvas: width is `base_width`, height is
/// `round(base_width / ratio)` and always at least 1.
pub fn resolve_canvas_with(
    elements: &[Element],
    base_width: f32,
    fallback_ratio: f32,
) -> CanvasSize {
    let fallback = if fallback_ratio > 0.0 && fallback_ratio.is_finite() {
        fallback_ratio
    } else {
        FALLBACK_RATIO
    };
    let ratio = aspect_ratio(elements).unwrap_or(fallback);
    let width = base_width.round().max(1.0);
    let height = (width / ratio).round().max(1.0);

    CanvasSize {
        width: width as u32,
        height: height as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(width: Option<f32>, height: Option<f32>) -> Element {
        let mut e = Element::new(SIGNATURE_NAME_KEY);
        e.width = width;
        e.height = height;
        e
    }

    #[test]
    fn ratio_from_hint_element() {
        let size = resolve_canvas(&[hint(Some(350.0), Some(200.0))]);
        assert_eq!(size, CanvasSize { width: 336, height: 192 });
    }

    #[test]
    fn fallback_without_hint() {
        let size = resolve_canvas(&[Element::new("email")]);
        assert_eq!(size, CanvasSize { width: 336, height: 192 });
    }

    #[test]
    fn zero_or_missing_dimensions_fall_back() {
        assert_eq!(resolve_canvas(&[hint(Some(350.0), Some(0.0))]).height, 192);
        assert_eq!(resolve_canvas(&[hint(Some(0.0), Some(200.0))]).height, 192);
        assert_eq!(resolve_canvas(&[hint(Some(350.0), None)]).height, 192);
        assert_eq!(resolve_canvas(&[hint(None, None)]).height, 192);
    }

    #[test]
    fn extreme_ratio_keeps_height_positive() {
        let size = resolve_canvas(&[hint(Some(100_000.0), Some(1.0))]);
        assert_eq!(size.height, 1);
    }

    #[test]
    fn square_hint() {
        let size = resolve_canvas(&[hint(Some(80.0), Some(80.0))]);
        assert_eq!(size.height, 336);
    }

    #[test]
    fn scaled_dimensions() {
        let size = CanvasSize { width: 336, height: 192 };
        assert_eq!(size.scaled(3.0), (1008, 576));
        assert_eq!(size.scaled(1.5), (504, 288));
    }
}
