//! Display-text derivation and text block layout.
//!
//! A text field either shows its own value or, when its key is the parent of
//! a composite group, the separator-joined values of its shown children.
//! `fullName` is the one parent that always shows its own literal value.

use crate::element::{CUSTOM_TEXT_PREFIX, Element, non_empty};
use crate::fonts::{FontRegistry, FontSpec};

/// Joiner used when a composite parent carries no `separator`.
pub const DEFAULT_SEPARATOR: &str = ", ";
/// Label sentinel selecting icon + text rendering.
pub const ICON_LABEL: &str = "ICON";
/// Composite parent whose own value wins over its children.
pub const FULL_NAME_KEY: &str = "fullName";

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

// ============================================================================
// GroupTable
// ============================================================================

/// Ordered mapping from a composite parent key to its child keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    groups: Vec<(String, Vec<String>)>,
}

impl Default for GroupTable {
    fn default() -> Self {
        Self::new()
            .with_group(FULL_NAME_KEY, ["prefix", "firstName", "lastName"])
            .with_group("website", ["website"])
            .with_group("companyName", ["companyName"])
            .with_group("designation", ["designation"])
            .with_group("email", ["email", "email1", "email2"])
            .with_group("mobileNumber", ["mobileNumber", "mobileNumber1", "mobileNumber2"])
            .with_group("landlineNumber", ["landlineNumber", "landlineNumber1", "landlineNumber2"])
            .with_group("fax", ["fax", "fax1"])
            .with_group(
                "addressLine1",
                ["addressLine1", "addressLine2", "city", "state", "country", "pincode"],
            )
    }
}

impl GroupTable {
    /// An empty table; no key is a composite parent.
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Adds or replaces the group for `parent`.
    pub fn with_group<I, S>(mut self, parent: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parent = parent.into();
        let children: Vec<String> = children.into_iter().map(Into::into).collect();
        match self.groups.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, existing)) => *existing = children,
            None => self.groups.push((parent, children)),
        }
        self
    }

    pub fn children(&self, parent: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(p, _)| p == parent)
            .map(|(_, c)| c.as_slice())
    }

    pub fn is_parent(&self, key: &str) -> bool {
        self.children(key).is_some()
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(p, _)| p.as_str())
    }
}

// ============================================================================
// Display text
// ============================================================================

/// The string a text field displays, empty when nothing resolves.
///
/// Hidden elements resolve to nothing. For a group parent, every child whose
/// own element is shown and non-empty is joined in table order; missing and
/// hidden children are skipped without leaving stray separators.
pub fn display_text(element: &Element, all: &[Element], groups: &GroupTable) -> String {
    if !element.show {
        return String::new();
    }

    let Some(children) = groups.children(&element.key) else {
        return element.value.clone().unwrap_or_default();
    };

    if element.key == FULL_NAME_KEY {
        return element.value.clone().unwrap_or_default();
    }

    let separator = element.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR);
    children
        .iter()
        .filter_map(|child| {
            all.iter()
                .find(|e| e.key == *child)
                .filter(|e| e.show)
                .and_then(|e| non_empty(e.value.as_deref()))
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whether the field is drawn as icon + text.
pub fn is_icon_label(element: &Element) -> bool {
    element.label.as_deref() == Some(ICON_LABEL)
}

/// Applies the `"<label> : "` prefix for non-icon labels. Free-text fields
/// never carry a prefix.
pub fn labelled_text(element: &Element, text: &str) -> String {
    match element.label.as_deref().filter(|l| !l.is_empty()) {
        Some(label) if label != ICON_LABEL && !element.key.starts_with(CUSTOM_TEXT_PREFIX) => {
            format!("{label} : {text}")
        }
        _ => text.to_string(),
    }
}

/// Font request of a text element at `size` (already scaled by the caller).
pub fn font_spec(element: &Element, size: f32) -> FontSpec {
    let family = element
        .font_family
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY);
    FontSpec {
        family: family.trim().to_string(),
        size,
        weight: element.font_weight.as_ref().map_or(400, |w| w.to_numeric()),
        italic: element
            .font_style
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .is_some_and(|s| matches!(s.as_str(), "italic" | "oblique")),
    }
}

/// `"<weight> <style>"`, weight 400 and style `normal` when unset.
pub fn resolve_font_style(element: &Element) -> String {
    let weight = element.font_weight.as_ref().map_or(400, |w| w.to_numeric());
    let style = element
        .font_style
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("normal");
    format!("{weight} {style}")
}

// ============================================================================
// Alignment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// `start` reads as left and `end` as right; unknown values are left.
    pub fn resolve(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("center") | Some("middle") => Self::Center,
            Some("right") | Some("end") => Self::Right,
            _ => Self::Left,
        }
    }

    /// Horizontal offset of a run of `run_width` inside a box of `box_width`.
    pub fn offset(self, box_width: f32, run_width: f32) -> f32 {
        let slack = box_width - run_width;
        match self {
            Self::Left => 0.0,
            Self::Center => slack / 2.0,
            Self::Right => slack,
        }
    }
}

// ============================================================================
// Text block layout
// ============================================================================

/// One laid-out line relative to its text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Aligned x offset inside the block.
    pub x: f32,
    /// Measured glyph-run width.
    pub width: f32,
}

/// A wrapped and aligned paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub box_width: f32,
    pub line_height: f32,
}

impl TextBlock {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    /// Alignment offset of the first line; icons follow this offset.
    pub fn lead_offset(&self) -> f32 {
        self.lines.first().map_or(0.0, |l| l.x)
    }
}

/// Wraps `text` into `box_width` (unbounded when `None`) and aligns each line.
///
/// Breaks at spaces, honours explicit newlines, and splits a single word
/// that is wider than the box at character boundaries.
pub fn layout_block(
    text: &str,
    box_width: Option<f32>,
    align: Align,
    spec: &FontSpec,
    line_height: f32,
    fonts: &FontRegistry,
) -> TextBlock {
    let measure = |s: &str| fonts.measure(s, spec);

    let mut raw_lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        match box_width {
            Some(limit) if limit > 0.0 => {
                wrap_paragraph(paragraph, limit, &measure, &mut raw_lines)
            }
            _ => raw_lines.push(paragraph.to_string()),
        }
    }

    let measured: Vec<(String, f32)> = raw_lines
        .into_iter()
        .map(|line| {
            let w = measure(&line);
            (line, w)
        })
        .collect();

    let box_width = box_width
        .filter(|w| *w > 0.0)
        .unwrap_or_else(|| measured.iter().map(|(_, w)| *w).fold(0.0, f32::max));

    let lines = measured
        .into_iter()
        .map(|(text, width)| TextLine {
            x: align.offset(box_width, width),
            text,
            width,
        })
        .collect();

    TextBlock {
        lines,
        box_width,
        line_height,
    }
}

fn wrap_paragraph(
    paragraph: &str,
    limit: f32,
    measure: &dyn Fn(&str) -> f32,
    out: &mut Vec<String>,
) {
    let mut current = String::new();

    for word in paragraph.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= limit {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        if measure(word) <= limit {
            current = word.to_string();
        } else {
            // Character-level fallback for words wider than the box.
            for c in word.chars() {
                let mut next = current.clone();
                next.push(c);
                if !current.is_empty() && measure(&next) > limit {
                    out.push(std::mem::take(&mut current));
                    current.push(c);
                } else {
                    current = next;
                }
            }
        }
    }

    out.push(current);
}

// ============================================================================
// Tests
// ============================================================================
