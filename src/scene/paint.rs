//! Colours and stroke/fill styling shared by every node type.

use palette::Srgb;

// ============================================================================
// Color
// ============================================================================

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 255)
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Parses a CSS colour: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(..)`, `rgba(..)`, `transparent`, or a named colour.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        if s.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = functional_args(s) {
            return parse_functional(args);
        }
        palette::named::from_str(&s.to_ascii_lowercase()).map(Self::from)
    }

    /// Parses `input`, falling back to `default` when absent or invalid.
    pub fn parse_or(input: Option<&str>, default: Color) -> Self {
        input.and_then(Self::parse).unwrap_or(default)
    }

    /// `#rrggbb` without alpha; alpha travels separately as an opacity.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    pub fn opacity(&self) -> f32 {
        self.alpha as f32 / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == 255
    }
}

impl From<Srgb<u8>> for Color {
    fn from(c: Srgb<u8>) -> Self {
        Self::rgb(c.red, c.green, c.blue)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let (rgb, alpha) = match hex.len() {
        3 | 6 => (hex, None),
        4 => (&hex[..3], Some(&hex[3..])),
        8 => (&hex[..6], Some(&hex[6..])),
        _ => return None,
    };
    let rgb: Srgb<u8> = rgb.parse().ok()?;
    let alpha = match alpha {
        None => 255,
        Some(a) if a.len() == 1 => u8::from_str_radix(a, 16).ok()? * 17,
        Some(a) => u8::from_str_radix(a, 16).ok()?,
    };
    Some(Color::rgba(rgb.red, rgb.green, rgb.blue, alpha))
}

fn functional_args(s: &str) -> Option<&str> {
    let lower = s.get(..5)?.to_ascii_lowercase();
    let rest = if lower == "rgba(" {
        &s[5..]
    } else if lower.starts_with("rgb(") {
        &s[4..]
    } else {
        return None;
    };
    rest.strip_suffix(')')
}

fn parse_functional(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v: f32 = p.parse().ok()?;
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => {
            let v: f32 = a.parse().ok()?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

// ============================================================================
// Paint
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }

    /// Round caps and joins.
    pub fn rounded(mut self) -> Self {
        self.cap = LineCap::Round;
        self.join = LineJoin::Round;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }
}

/// Fill, stroke and group opacity of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub opacity: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            opacity: 1.0,
        }
    }
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn stroke(stroke: Stroke) -> Self {
        Self {
            stroke: Some(stroke),
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, stroke: Option<Stroke>) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#000000"), Some(Color::BLACK));
        assert_eq!(Color::parse("#f0c000"), Some(Color::rgb(0xf0, 0xc0, 0x00)));
        assert_eq!(Color::parse("#0b2e79ff"), Some(Color::rgb(0x0b, 0x2e, 0x79)));
        assert_eq!(Color::parse("#00000080"), Some(Color::rgba(0, 0, 0, 0x80)));
        assert_eq!(Color::parse("#ccc8"), Some(Color::rgba(0xcc, 0xcc, 0xcc, 0x88)));
    }

    #[test]
    fn parses_named_and_functional() {
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert_eq!(Color::parse("Red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgba(1,2,3,0.5)"), Some(Color::rgba(1, 2, 3, 128)));
        assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
    }

    #[test]
    fn invalid_colors_fall_back() {
        assert_eq!(Color::parse("#12"), None);
        assert_eq!(Color::parse("not-a-colour"), None);
        assert_eq!(Color::parse("#abé"), None);
        assert_eq!(Color::parse("#abcdeé"), None);
        assert_eq!(Color::parse_or(Some("#é12"), Color::BLACK), Color::BLACK);
        assert_eq!(Color::parse_or(Some("bogus"), Color::WHITE), Color::WHITE);
        assert_eq!(Color::parse_or(None, Color::BLACK), Color::BLACK);
    }

    #[test]
    fn hex_output_drops_alpha() {
        assert_eq!(Color::rgba(0x12, 0xab, 0xff, 10).to_hex(), "#12abff");
    }
}
