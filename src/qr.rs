//! QR code rasterization with round dots and rounded finder eyes.
//!
//! The module matrix comes from the `qrcode` encoder at error-correction
//! level H. Painting is done here: a quiet-zone background, one dot per dark
//! data module, then the three finder eyes as nested rounded squares.
//! Modules are whole-pixel cells so every module boundary is crisp.

use image::RgbaImage;
use qrcode::{EcLevel, QrCode};

use crate::error::Result;
use crate::fonts::FontRegistry;
use crate::layout::CanvasSize;
use crate::scene::svg::rasterize;
use crate::scene::{CircleNode, Color, GroupNode, LayerKind, Paint, RectNode, Scene};

/// Blank modules around the symbol on every side.
pub const QUIET_ZONE: usize = 4;

/// Side of a finder pattern, in modules.
pub const FINDER_SIZE: usize = 7;

/// Dot radius as a fraction of the cell size.
pub const DOT_RADIUS: f32 = 0.42;

/// Encoded when a QR element carries no link, so the code is never blank.
pub const PLACEHOLDER: &str = "Invalid Link !";

/// Payload to encode for an optional link.
pub fn payload(link: Option<&str>) -> &str {
    link.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(PLACEHOLDER)
}

// ============================================================================
// Module matrix
// ============================================================================

/// Square grid of dark/light modules, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Encodes `value` at error-correction level H.
    pub fn encode(value: &str) -> Result<Self> {
        let code = QrCode::with_error_correction_level(value.as_bytes(), EcLevel::H)?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self {
            width: code.width(),
            modules,
        })
    }

    pub fn from_modules(width: usize, modules: Vec<bool>) -> Option<Self> {
        (modules.len() == width * width).then_some(Self { width, modules })
    }

    /// Modules per side (without quiet zone).
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < self.width && col < self.width && self.modules[row * self.width + col]
    }

    /// Whether (`row`, `col`) lies in one of the three finder corners.
    pub fn in_finder(&self, row: usize, col: usize) -> bool {
        let far = self.width.saturating_sub(FINDER_SIZE);
        (row < FINDER_SIZE && col < FINDER_SIZE)
            || (row < FINDER_SIZE && col >= far)
            || (row >= far && col < FINDER_SIZE)
    }

    /// Top-left module of each finder pattern as (row, col).
    pub fn finder_origins(&self) -> [(usize, usize); 3] {
        let far = self.width.saturating_sub(FINDER_SIZE);
        [(0, 0), (0, far), (far, 0)]
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Pixel layout of a symbol drawn into a requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrGeometry {
    /// Modules per side including the quiet zone.
    pub total: usize,
    /// Whole-pixel cell size, at least 1.
    pub cell: u32,
    /// `cell * total`, never larger than the request unless the cell was
    /// clamped up to 1.
    pub size: u32,
}

impl QrGeometry {
    pub fn new(modules: usize, requested: u32) -> Self {
        let total = modules + 2 * QUIET_ZONE;
        let cell = (requested / total as u32).max(1);
        Self {
            total,
            cell,
            size: cell * total as u32,
        }
    }

    /// Top-left corner of module (`row`, `col`) inside the symbol.
    fn origin(&self, row: usize, col: usize) -> (f32, f32) {
        let cell = self.cell as f32;
        ((col + QUIET_ZONE) as f32 * cell, (row + QUIET_ZONE) as f32 * cell)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Builds the QR group for `value` with its top-left corner at (`x`, `y`).
pub fn render_node(
    value: &str,
    x: f32,
    y: f32,
    size: u32,
    fg: Color,
    bg: Color,
) -> Result<GroupNode> {
    let matrix = ModuleMatrix::encode(value)?;
    Ok(paint_matrix(&matrix, x, y, size, fg, bg))
}

/// Renders `value` to a standalone image of `cell * total` pixels per side.
pub fn render(value: &str, size: u32, fg: Color, bg: Color) -> Result<RgbaImage> {
    let matrix = ModuleMatrix::encode(value)?;
    let geometry = QrGeometry::new(matrix.width(), size);

    let mut scene = Scene::new(CanvasSize {
        width: geometry.size,
        height: geometry.size,
    });
    scene.push(LayerKind::Images, None, paint_matrix(&matrix, 0.0, 0.0, size, fg, bg));
    rasterize(&scene, 1.0, &FontRegistry::empty())
}

/// Paints an already encoded matrix.
pub fn paint_matrix(
    matrix: &ModuleMatrix,
    x: f32,
    y: f32,
    size: u32,
    fg: Color,
    bg: Color,
) -> GroupNode {
    let geometry = QrGeometry::new(matrix.width(), size);
    let cell = geometry.cell as f32;
    let mut group = GroupNode::new(x, y);

    group.push(RectNode::new(
        0.0,
        0.0,
        geometry.size as f32,
        geometry.size as f32,
        Paint::fill(bg),
    ));

    for row in 0..matrix.width() {
        for col in 0..matrix.width() {
            if !matrix.is_dark(row, col) || matrix.in_finder(row, col) {
                continue;
            }
            let (mx, my) = geometry.origin(row, col);
            group.push(CircleNode {
                cx: mx + cell / 2.0,
                cy: my + cell / 2.0,
                radius: cell * DOT_RADIUS,
                paint: Paint::fill(fg),
            });
        }
    }

    for (row, col) in matrix.finder_origins() {
        let (px, py) = geometry.origin(row, col);
        let ring = |inset: f32, span: f32, radius: f32, color: Color| {
            let side = span * cell;
            RectNode::new(px + inset * cell, py + inset * cell, side, side, Paint::fill(color))
                .with_corner_radius(radius * cell)
        };
        group.push(ring(0.0, 7.0, 1.4, fg));
        group.push(ring(1.0, 5.0, 1.2, bg));
        group.push(ring(2.0, 3.0, 1.0, fg));
    }

    group
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::scene::Node;
    use pretty_assertions::assert_eq;

    /// Reads each module centre back out of a rendered symbol.
    fn sample(img: &RgbaImage, width: usize, geometry: QrGeometry) -> ModuleMatrix {
        let cell = geometry.cell;
        let mut modules = Vec::with_capacity(width * width);
        for row in 0..width {
            for col in 0..width {
                let px = (col + QUIET_ZONE) as u32 * cell + cell / 2;
                let py = (row + QUIET_ZONE) as u32 * cell + cell / 2;
                let p = img.get_pixel(px, py);
                let luma = (p[0] as u32 + p[1] as u32 + p[2] as u32) / 3;
                modules.push(luma < 128);
            }
        }
        ModuleMatrix::from_modules(width, modules).unwrap()
    }

    fn assert_round_trip(value: &str, size: u32) {
        let matrix = ModuleMatrix::encode(value).unwrap();
        let geometry = QrGeometry::new(matrix.width(), size);
        let img = render(value, size, Color::BLACK, Color::WHITE).unwrap();

        assert_eq!(img.dimensions(), (geometry.size, geometry.size));
        assert_eq!(sample(&img, matrix.width(), geometry), matrix);
    }

    #[test]
    fn geometry_uses_whole_cells() {
        let g = QrGeometry::new(21, 80);
        assert_eq!(g, QrGeometry { total: 29, cell: 2, size: 58 });

        let g = QrGeometry::new(21, 330);
        assert_eq!(g, QrGeometry { total: 29, cell: 11, size: 319 });
    }

    #[test]
    fn tiny_request_clamps_cell() {
        let g = QrGeometry::new(21, 10);
        assert_eq!(g.cell, 1);
        assert_eq!(g.size, 29);
    }

    #[test]
    fn finder_corners() {
        let m = ModuleMatrix::encode("HELLO").unwrap();
        assert_eq!(m.width(), 21);
        assert!(m.in_finder(0, 0));
        assert!(m.in_finder(6, 20));
        assert!(m.in_finder(20, 6));
        assert!(!m.in_finder(20, 20));
        assert!(!m.in_finder(7, 7));
        assert_eq!(m.finder_origins(), [(0, 0), (0, 14), (14, 0)]);
    }

    #[test]
    fn paint_order_is_background_dots_then_eyes() {
        let m = ModuleMatrix::encode("HELLO").unwrap();
        let group = paint_matrix(&m, 5.0, 6.0, 330, Color::BLACK, Color::WHITE);

        assert!(matches!(group.children.first(), Some(Node::Rect(r)) if r.width == 319.0));
        let eyes = &group.children[group.children.len() - 9..];
        assert!(eyes.iter().all(|n| matches!(n, Node::Rect(_))));

        let dots = group.children.len() - 10;
        let expected = (0..21)
            .flat_map(|r| (0..21).map(move |c| (r, c)))
            .filter(|&(r, c)| m.is_dark(r, c) && !m.in_finder(r, c))
            .count();
        assert_eq!(dots, expected);

        if let Some(Node::Circle(dot)) = group.children.get(1) {
            assert!((dot.radius - 11.0 * DOT_RADIUS).abs() < 1e-4);
        } else {
            panic!("expected a dot after the background");
        }
    }

    #[test]
    fn round_trips_short_text() {
        assert_round_trip("HELLO", 330);
    }

    #[test]
    fn round_trips_url() {
        assert_round_trip("https://example.com/card?id=42", 400);
    }

    #[test]
    fn rendering_is_idempotent() {
        let a = render("https://example.com", 120, Color::BLACK, Color::WHITE).unwrap();
        let b = render("https://example.com", 120, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let value = "x".repeat(4000);
        assert!(matches!(
            ModuleMatrix::encode(&value),
            Err(RenderError::QrEncode(_))
        ));
    }

    #[test]
    fn missing_link_uses_placeholder() {
        assert_eq!(payload(None), PLACEHOLDER);
        assert_eq!(payload(Some("  ")), PLACEHOLDER);
        assert_eq!(payload(Some("https://x.io")), "https://x.io");
    }
}
