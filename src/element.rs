//! Input element model.
//!
//! An [`Element`] is one positioned visual unit of a signature: a text field,
//! an asset, a shape, the QR code or the background. Elements arrive as JSON
//! from the upstream data-mapping step and are classified exactly once per
//! render into an [`ElementKind`], after which every layer dispatches on the
//! tag instead of comparing keys.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "key": "email",
//!   "show": true,
//!   "position": { "x": 20, "y": 110 },
//!   "width": 180,
//!   "fontSize": 11,
//!   "fontWeight": 700,
//!   "label": "ICON",
//!   "color": "#1d2b4f"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::text::GroupTable;

/// Key of the aspect-ratio hint element.
pub const SIGNATURE_NAME_KEY: &str = "signatureName";
/// Key prefix of free-text fields.
pub const CUSTOM_TEXT_PREFIX: &str = "customText-";
/// Key prefix of social links (delivered outside the bitmap).
pub const SOCIAL_PREFIX: &str = "social-";

// ============================================================================
// Element
// ============================================================================

/// Top-left anchor of an element in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Font weight as it appears in element JSON: a number or a keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeightValue {
    Numeric(f32),
    Named(String),
}

impl FontWeightValue {
    /// Resolves to a CSS numeric weight, 400 when unrecognized.
    pub fn to_numeric(&self) -> u16 {
        match self {
            Self::Numeric(n) => n.round().clamp(1.0, 1000.0) as u16,
            Self::Named(name) => match name.trim().to_ascii_lowercase().as_str() {
                "bold" | "bolder" => 700,
                "lighter" => 300,
                other => other.parse::<u16>().map(|n| n.clamp(1, 1000)).unwrap_or(400),
            },
        }
    }
}

/// One entry of the input list.
///
/// Every field except `key` is optional; absent styling falls back to the
/// per-role defaults documented on the layer that draws the element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Element {
    /// Identity; numbered variants follow `<baseKey><index>`.
    pub key: String,

    /// Hidden elements are excluded from every layer and every composite.
    pub show: bool,

    /// Absent for definition-only entries that are never placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,

    /// Literal text, or an image source (URL / inline payload).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Hyperlink target; preferred over `value` for assets and the QR code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Joiner used when this element is a composite parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeightValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,

    /// CSS decoration line (`underline`, `line-through`).
    #[serde(alias = "textDecoration", skip_serializing_if = "Option::is_none")]
    pub font_decoration_line: Option<String>,

    /// `"ICON"` selects icon + text rendering; anything else is a prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,

    /// Flat `[x0, y0, x1, y1, ...]` sequence for lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f32>>,
}

impl Element {
    /// Creates a shown element with the given key and no other data.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            show: true,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show = false;
        self
    }

    /// `link` when non-empty, otherwise `value` when non-empty.
    pub fn source(&self) -> Option<&str> {
        non_empty(self.link.as_deref()).or_else(|| non_empty(self.value.as_deref()))
    }

    /// `value` when non-empty.
    pub fn text_value(&self) -> Option<&str> {
        non_empty(self.value.as_deref())
    }
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Request body accepted by the renderer front ends: either a bare list or
/// `{ "elements": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderRequest {
    Bare(Vec<Element>),
    Wrapped { elements: Vec<Element> },
}

impl RenderRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_elements(self) -> Vec<Element> {
        match self {
            Self::Bare(elements) | Self::Wrapped { elements } => elements,
        }
    }
}

// ============================================================================
// ElementKind
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Rect,
    Line,
}

impl ShapeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Some(Self::Circle),
            "rect" | "rectangle" => Some(Self::Rect),
            "line" => Some(Self::Line),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundRole {
    Color,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRole {
    Logo,
    ProfilePhoto,
}

impl AssetRole {
    /// Profile photos are clipped to a circle; logos are drawn as-is.
    pub fn is_circular(self) -> bool {
        matches!(self, Self::ProfilePhoto)
    }
}

/// Dispatch tag of an element, resolved once per render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Background(BackgroundRole),
    Shape(ShapeType),
    Asset(AssetRole),
    Qr,
    /// Parent of a composite group; text is joined from its children.
    CompositeText,
    /// `customText-*` field rendered verbatim.
    FreeText,
    /// Never drawn directly: sizing hints, social links, group children,
    /// malformed shapes and unrecognized keys.
    Inert,
}

impl ElementKind {
    /// Classifies an element against the active grouping table.
    ///
    /// Anything carrying a `shapeType` is a shape regardless of its key; an
    /// unrecognized shape type makes the element inert.
    pub fn classify(element: &Element, groups: &GroupTable) -> Self {
        if let Some(shape) = element.shape_type.as_deref().filter(|s| !s.is_empty()) {
            return match ShapeType::parse(shape) {
                Some(shape) => Self::Shape(shape),
                None => {
                    log::warn!("element '{}' has unknown shape type '{}'", element.key, shape);
                    Self::Inert
                }
            };
        }

        let key = element.key.as_str();
        match key {
            "backgroundColor" => Self::Background(BackgroundRole::Color),
            "backgroundImage" => Self::Background(BackgroundRole::Image),
            "logo" => Self::Asset(AssetRole::Logo),
            "profilePhoto" => Self::Asset(AssetRole::ProfilePhoto),
            "qrCode" => Self::Qr,
            SIGNATURE_NAME_KEY | "banner" | "disclaimer" => Self::Inert,
            _ if key.starts_with(SOCIAL_PREFIX) => Self::Inert,
            _ if key.starts_with(CUSTOM_TEXT_PREFIX) => Self::FreeText,
            _ if groups.is_parent(key) => Self::CompositeText,
            _ => Self::Inert,
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Self::CompositeText | Self::FreeText)
    }
}

// ============================================================================
// Tests
// ============================================================================
