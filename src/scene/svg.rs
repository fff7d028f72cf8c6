//! Scene rasterization using resvg/usvg.
//!
//! The scene is serialized to an SVG document in logical units, parsed with
//! the registry's font database and rendered at the export scale. The
//! resulting pixmap is un-premultiplied into an [`RgbaImage`].

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use super::paint::{LineCap, LineJoin, Paint};
use super::{
    CircleNode, GroupNode, ImageNode, Node, PathNode, PolylineNode, RectNode, Scene, TextNode,
};
use crate::error::{RenderError, Result};
use crate::fonts::FontRegistry;

// ============================================================================
// Serialization
// ============================================================================

/// Serializes `scene` to an SVG document sized to its logical canvas.
pub fn scene_to_svg(scene: &Scene, fonts: &FontRegistry) -> String {
    let (w, h) = (scene.canvas.width, scene.canvas.height);
    let mut writer = SvgWriter {
        out: String::with_capacity(4096),
        fonts,
        next_clip: 0,
    };

    writer.out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
    writer.out.push_str(r#" xmlns:xlink="http://www.w3.org/1999/xlink""#);
    let _ = write!(writer.out, r#" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#);
    for layer in scene.layers() {
        writer.out.push_str("<g>");
        for entry in &layer.entries {
            writer.node(&entry.node);
        }
        writer.out.push_str("</g>");
    }
    writer.out.push_str("</svg>");
    writer.out
}

struct SvgWriter<'a> {
    out: String,
    fonts: &'a FontRegistry,
    next_clip: usize,
}

impl SvgWriter<'_> {
    fn node(&mut self, node: &Node) {
        match node {
            Node::Rect(r) => self.rect(r),
            Node::Circle(c) => self.circle(c),
            Node::Polyline(p) => self.polyline(p),
            Node::Path(p) => self.path(p),
            Node::Image(i) => self.image(i),
            Node::Text(t) => self.text(t),
            Node::Group(g) => self.group(g),
        }
    }

    fn rect(&mut self, r: &RectNode) {
        let _ = write!(
            self.out,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            num(r.x),
            num(r.y),
            num(r.width.max(0.0)),
            num(r.height.max(0.0))
        );
        if r.corner_radius > 0.0 {
            let radius = num(r.corner_radius);
            let _ = write!(self.out, r#" rx="{radius}" ry="{radius}""#);
        }
        self.paint(&r.paint);
        self.out.push_str("/>");
    }

    fn circle(&mut self, c: &CircleNode) {
        let _ = write!(
            self.out,
            r#"<circle cx="{}" cy="{}" r="{}""#,
            num(c.cx),
            num(c.cy),
            num(c.radius.max(0.0))
        );
        self.paint(&c.paint);
        self.out.push_str("/>");
    }

    fn polyline(&mut self, p: &PolylineNode) {
        self.out.push_str(r#"<polyline points=""#);
        for (i, (x, y)) in p.points.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            let _ = write!(self.out, "{},{}", num(*x), num(*y));
        }
        self.out.push('"');
        self.paint(&p.paint);
        self.out.push_str("/>");
    }

    fn path(&mut self, p: &PathNode) {
        let _ = write!(self.out, r#"<path d="{}""#, escape(p.data.trim()));
        self.paint(&p.paint);
        self.out.push_str("/>");
    }

    fn image(&mut self, i: &ImageNode) {
        let (x, y, w, h) = (num(i.x), num(i.y), num(i.width.max(0.0)), num(i.height.max(0.0)));

        let clip = if i.clip_radius > 0.0 {
            let id = self.next_clip;
            self.next_clip += 1;
            let radius = num(i.clip_radius.min(i.width.min(i.height) / 2.0));
            let _ = write!(
                self.out,
                r#"<clipPath id="clip{id}"><rect x="{x}" y="{y}" width="{w}" height="{h}""#
            );
            let _ = write!(self.out, r#" rx="{radius}" ry="{radius}"/></clipPath>"#);
            Some(id)
        } else {
            None
        };

        let _ = write!(
            self.out,
            r#"<image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="none""#
        );
        if let Some(id) = clip {
            let _ = write!(self.out, r#" clip-path="url(#clip{id})""#);
        }
        let _ = write!(
            self.out,
            r#" xlink:href="data:image/png;base64,{}"/>"#,
            STANDARD.encode(&i.png)
        );
    }

    fn text(&mut self, t: &TextNode) {
        let family = self
            .fonts
            .resolved_family(&t.font)
            .unwrap_or_else(|| t.font.family.clone());
        let family = family.replace(['\'', '"'], "");

        for (index, line) in t.block.lines.iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            let baseline = t.y + index as f32 * t.block.line_height + t.baseline;
            let _ = write!(
                self.out,
                r#"<text x="{}" y="{}" font-family="'{}', sans-serif" font-size="{}""#,
                num(t.x + line.x),
                num(baseline),
                escape(&family),
                num(t.font.size),
            );
            let _ = write!(
                self.out,
                r#" font-weight="{}" font-style="{}" fill="{}""#,
                t.font.weight,
                if t.font.italic { "italic" } else { "normal" },
                t.color.to_hex()
            );
            if !t.color.is_opaque() {
                let _ = write!(self.out, r#" fill-opacity="{}""#, num(t.color.opacity()));
            }
            if let Some(decoration) = t.decoration.as_deref().filter(|d| !d.trim().is_empty()) {
                let _ = write!(self.out, r#" text-decoration="{}""#, escape(decoration.trim()));
            }
            let _ = write!(self.out, r#" xml:space="preserve">{}</text>"#, escape(&line.text));
        }
    }

    fn group(&mut self, g: &GroupNode) {
        let _ = write!(self.out, r#"<g transform="translate({} {})"#, num(g.x), num(g.y));
        if g.scale != 1.0 {
            let _ = write!(self.out, " scale({})", num(g.scale));
        }
        self.out.push_str(r#"">"#);
        for child in &g.children {
            self.node(child);
        }
        self.out.push_str("</g>");
    }

    fn paint(&mut self, paint: &Paint) {
        match paint.fill {
            Some(fill) => {
                let _ = write!(self.out, r#" fill="{}""#, fill.to_hex());
                if !fill.is_opaque() {
                    let _ = write!(self.out, r#" fill-opacity="{}""#, num(fill.opacity()));
                }
            }
            None => self.out.push_str(r#" fill="none""#),
        }

        if let Some(stroke) = &paint.stroke {
            let _ = write!(
                self.out,
                r#" stroke="{}" stroke-width="{}""#,
                stroke.color.to_hex(),
                num(stroke.width)
            );
            if !stroke.color.is_opaque() {
                let _ = write!(self.out, r#" stroke-opacity="{}""#, num(stroke.color.opacity()));
            }
            if stroke.cap == LineCap::Round {
                self.out.push_str(r#" stroke-linecap="round""#);
            }
            if stroke.join == LineJoin::Round {
                self.out.push_str(r#" stroke-linejoin="round""#);
            }
        }

        if paint.opacity < 1.0 {
            let _ = write!(self.out, r#" opacity="{}""#, num(paint.opacity));
        }
    }
}

/// Non-finite coordinates collapse to zero so the document always parses.
fn num(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// Escapes markup characters and drops code points XML 1.0 does not allow.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Rasterization
// ============================================================================

/// Renders `scene` at `scale` device pixels per logical unit.
pub fn render_scene(scene: &Scene, scale: f32, fonts: &FontRegistry) -> Result<Pixmap> {
    let svg = scene_to_svg(scene, fonts);

    let mut opts = Options::default();
    opts.fontdb = fonts.database();
    let tree = Tree::from_str(&svg, &opts)?;

    let (width, height) = scene.canvas.scaled(scale);
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    log::debug!("rasterized scene at {width}x{height} (scale {scale})");
    Ok(pixmap)
}

/// Renders `scene` straight to a straight-alpha image.
pub fn rasterize(scene: &Scene, scale: f32, fonts: &FontRegistry) -> Result<RgbaImage> {
    render_scene(scene, scale, fonts).map(|p| pixmap_to_rgba_image(&p))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        // tiny_skia stores premultiplied alpha
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        *dst = Rgba([r, g, b, a]);
    }

    img
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
