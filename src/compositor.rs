//! Signature composition: elements in, layered scene and PNG out.
//!
//! [`SignatureRenderer`] drives one render in a fixed order:
//!
//! 1. **Canvas** from the sizing hint element
//! 2. **Acquisition** of every image-bearing element, concurrently
//! 3. **Background** image or colour, with rounded corners
//! 4. **Shapes** (circle, rect, line)
//! 5. **Images** (logo, profile photo), then the **QR code**
//! 6. **Text** fields, with optional icons
//!
//! A single element that cannot be drawn is skipped; only a QR encoding
//! failure aborts the render.

use std::collections::HashMap;
use std::sync::Arc;

use crate::acquire::{AcquiredImage, ImageAcquirer};
use crate::config::RenderConfig;
use crate::element::{AssetRole, BackgroundRole, Element, ElementKind, ShapeType};
use crate::error::Result;
use crate::export::export_png;
use crate::fonts::FontRegistry;
use crate::icon::{ICON_GAP, ICON_SCALE, IconKind};
use crate::layout::{CanvasSize, resolve_canvas_with};
use crate::qr;
use crate::scene::{
    CircleNode, Color, GroupNode, ImageNode, LayerKind, Node, Paint, PolylineNode, RectNode, Scene,
    Stroke, TextNode,
};
use crate::text::{
    Align, DEFAULT_FONT_SIZE, GroupTable, display_text, font_spec, is_icon_label, labelled_text,
    layout_block,
};

/// Text box width relative to the element's declared width.
pub const TEXT_BOX_SCALE: f32 = 1.08;
/// Rendered font size relative to the declared `fontSize`.
pub const FONT_SIZE_SCALE: f32 = 0.82;
/// Line height relative to the rendered font size.
pub const LINE_HEIGHT: f32 = 1.1;

pub const DEFAULT_CIRCLE_RADIUS: f32 = 10.0;
pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;
const DEFAULT_CIRCLE_FILL: Color = Color::rgb(0xcc, 0xcc, 0xcc);
const DEFAULT_RECT_FILL: Color = Color::rgb(0xf0, 0xc0, 0x00);
const DEFAULT_LINE_STROKE: Color = Color::BLACK;
const DEFAULT_TEXT_COLOR: Color = Color::WHITE;
const DEFAULT_ICON_COLOR: Color = Color::BLACK;
const DEFAULT_BACKGROUND: Color = Color::WHITE;
const QR_FOREGROUND: Color = Color::BLACK;
const QR_BACKGROUND: Color = Color::WHITE;

// ============================================================================
// ResolvedImages
// ============================================================================

/// Acquired images keyed by the index of their element in the input list.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    by_index: HashMap<usize, Arc<AcquiredImage>>,
}

impl ResolvedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, image: Arc<AcquiredImage>) {
        self.by_index.insert(index, image);
    }

    pub fn with(mut self, index: usize, image: Arc<AcquiredImage>) -> Self {
        self.insert(index, image);
        self
    }

    pub fn get(&self, index: usize) -> Option<&Arc<AcquiredImage>> {
        self.by_index.get(&index)
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

// ============================================================================
// SignatureRenderer
// ============================================================================

/// Renders element lists into signature images.
///
/// Font registry and image acquirer are process-wide and shared by `Arc`;
/// a renderer can be used from many tasks at once.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use signature_renderer::{Element, FontRegistry, RenderConfig, SignatureRenderer};
///
/// # async fn run() -> signature_renderer::Result<()> {
/// let config = RenderConfig::default().with_env_overrides();
/// let fonts = Arc::new(FontRegistry::initialize(
///     &config.font_directories,
///     &config.fallback_font_family,
/// ));
/// let renderer = SignatureRenderer::new(config, fonts)?;
///
/// let elements = vec![Element::new("email").with_value("jane@example.com").at(20.0, 40.0)];
/// let png = renderer.render(&elements).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SignatureRenderer {
    config: RenderConfig,
    groups: GroupTable,
    fonts: Arc<FontRegistry>,
    images: Arc<ImageAcquirer>,
}

impl SignatureRenderer {
    /// Creates a renderer with its own image acquirer built from `config`.
    pub fn new(config: RenderConfig, fonts: Arc<FontRegistry>) -> Result<Self> {
        let images = Arc::new(ImageAcquirer::new(&config)?);
        Ok(Self::from_parts(config, fonts, images))
    }

    /// Creates a renderer around an existing acquirer, sharing its cache.
    pub fn from_parts(
        config: RenderConfig,
        fonts: Arc<FontRegistry>,
        images: Arc<ImageAcquirer>,
    ) -> Self {
        Self {
            config,
            groups: GroupTable::default(),
            fonts,
            images,
        }
    }

    /// Replaces the composite grouping table.
    pub fn with_groups(mut self, groups: GroupTable) -> Self {
        self.groups = groups;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn fonts(&self) -> &Arc<FontRegistry> {
        &self.fonts
    }

    pub fn images(&self) -> &Arc<ImageAcquirer> {
        &self.images
    }

    pub fn canvas(&self, elements: &[Element]) -> CanvasSize {
        resolve_canvas_with(elements, self.config.base_width, self.config.fallback_ratio)
    }

    /// Renders `elements` to PNG bytes at the configured export scale.
    pub async fn render(&self, elements: &[Element]) -> Result<Vec<u8>> {
        let scene = self.compose(elements).await?;
        export_png(&scene, self.config.export_scale, &self.fonts)
    }

    /// Renders with images that were acquired up front.
    pub fn render_with_images(
        &self,
        elements: &[Element],
        images: &ResolvedImages,
    ) -> Result<Vec<u8>> {
        let scene = self.compose_with_images(elements, images)?;
        export_png(&scene, self.config.export_scale, &self.fonts)
    }

    /// Acquires images and builds the scene.
    pub async fn compose(&self, elements: &[Element]) -> Result<Scene> {
        let images = self.acquire_images(elements).await;
        self.compose_with_images(elements, &images)
    }

    /// Resolves every drawable image-bearing element concurrently.
    pub async fn acquire_images(&self, elements: &[Element]) -> ResolvedImages {
        let wanted: Vec<(usize, &str)> = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.show)
            .filter(|(_, e)| match ElementKind::classify(e, &self.groups) {
                ElementKind::Background(BackgroundRole::Image) => true,
                ElementKind::Asset(_) => e.position.is_some(),
                _ => false,
            })
            .filter_map(|(i, e)| e.source().map(|s| (i, s)))
            .collect();

        if wanted.is_empty() {
            return ResolvedImages::new();
        }

        let sources: Vec<&str> = wanted.iter().map(|(_, s)| *s).collect();
        let results = self.images.resolve_all(&sources).await;

        let mut resolved = ResolvedImages::new();
        for ((index, _), image) in wanted.into_iter().zip(results) {
            if let Some(image) = image {
                resolved.insert(index, image);
            }
        }
        log::debug!("acquired {} of {} images", resolved.len(), sources.len());
        resolved
    }

    /// Builds the layered scene from `elements` and pre-acquired `images`.
    pub fn compose_with_images(
        &self,
        elements: &[Element],
        images: &ResolvedImages,
    ) -> Result<Scene> {
        let canvas = self.canvas(elements);
        let kinds: Vec<ElementKind> = elements
            .iter()
            .map(|e| ElementKind::classify(e, &self.groups))
            .collect();

        let mut composition = Composition {
            renderer: self,
            elements,
            kinds: &kinds,
            images,
            scene: Scene::new(canvas),
        };

        composition.background();
        composition.shapes();
        composition.assets();
        composition.qr_code()?;
        composition.text();

        log::debug!(
            "composed {}x{} scene with {} nodes",
            canvas.width,
            canvas.height,
            composition.scene.node_count()
        );
        Ok(composition.scene)
    }
}

// ============================================================================
// Composition
// ============================================================================

/// State of one in-progress composition.
struct Composition<'a> {
    renderer: &'a SignatureRenderer,
    elements: &'a [Element],
    kinds: &'a [ElementKind],
    images: &'a ResolvedImages,
    scene: Scene,
}

impl<'a> Composition<'a> {
    /// Shown elements whose kind matches `pred`, with their input index.
    fn shown(&self, pred: impl Fn(ElementKind) -> bool) -> Vec<(usize, &'a Element, ElementKind)> {
        self.elements
            .iter()
            .zip(self.kinds)
            .enumerate()
            .filter(|(_, (e, k))| e.show && pred(**k))
            .map(|(i, (e, k))| (i, e, *k))
            .collect()
    }

    fn background(&mut self) {
        let canvas = self.scene.canvas;
        let (w, h) = (canvas.width as f32, canvas.height as f32);
        let radius = self.renderer.config.background_corner_radius;

        let image = self
            .shown(|k| k == ElementKind::Background(BackgroundRole::Image))
            .into_iter()
            .find_map(|(i, e, _)| self.images.get(i).map(|img| (e.key.clone(), Arc::clone(img))));

        if let Some((key, image)) = image {
            self.scene.push(
                LayerKind::Background,
                Some(&key),
                ImageNode {
                    x: 0.0,
                    y: 0.0,
                    width: w,
                    height: h,
                    clip_radius: radius,
                    png: image.png(),
                },
            );
            return;
        }

        let color_element = self
            .shown(|k| k == ElementKind::Background(BackgroundRole::Color))
            .into_iter()
            .next()
            .map(|(_, e, _)| e);
        let fill = Color::parse_or(
            color_element.and_then(|e| e.value.as_deref()),
            DEFAULT_BACKGROUND,
        );

        self.scene.push(
            LayerKind::Background,
            color_element.map(|e| e.key.as_str()),
            RectNode::new(0.0, 0.0, w, h, Paint::fill(fill)).with_corner_radius(radius),
        );
    }

    fn shapes(&mut self) {
        for (_, e, kind) in self.shown(|k| matches!(k, ElementKind::Shape(_))) {
            let ElementKind::Shape(shape) = kind else {
                continue;
            };
            match shape_node(e, shape) {
                Some(node) => self.scene.push(LayerKind::Shapes, Some(&e.key), node),
                None => log::warn!("skipping {:?} shape '{}': missing geometry", shape, e.key),
            }
        }
    }

    fn assets(&mut self) {
        for (i, e, kind) in self.shown(|k| matches!(k, ElementKind::Asset(_))) {
            let ElementKind::Asset(role) = kind else {
                continue;
            };
            let Some(position) = e.position else {
                log::debug!("asset '{}' has no position", e.key);
                continue;
            };
            let Some(image) = self.images.get(i) else {
                log::debug!("asset '{}' has no image; omitted", e.key);
                continue;
            };

            let width = e.width.filter(|w| *w > 0.0).unwrap_or(image.width() as f32);
            let height = e.height.filter(|h| *h > 0.0).unwrap_or(image.height() as f32);
            let clip_radius = if role == AssetRole::ProfilePhoto { width / 2.0 } else { 0.0 };

            self.scene.push(
                LayerKind::Images,
                Some(&e.key),
                ImageNode {
                    x: position.x,
                    y: position.y,
                    width,
                    height,
                    clip_radius,
                    png: image.png(),
                },
            );
        }
    }

    fn qr_code(&mut self) -> Result<()> {
        let Some((_, e, _)) = self.shown(|k| k == ElementKind::Qr).into_iter().next() else {
            return Ok(());
        };

        let (x, y) = e.position.map_or((0.0, 0.0), |p| (p.x, p.y));
        let value = qr::payload(e.link.as_deref());
        let size = self.renderer.config.qr_size;
        let node = qr::render_node(value, x, y, size, QR_FOREGROUND, QR_BACKGROUND)?;
        self.scene.push(LayerKind::Images, Some(&e.key), node);
        Ok(())
    }

    fn text(&mut self) {
        let renderer = self.renderer;
        let fonts = renderer.fonts.as_ref();
        let mut placed = Vec::new();

        for (_, e, _) in self.shown(ElementKind::is_text) {
            let Some(position) = e.position else {
                log::debug!("text field '{}' has no position", e.key);
                continue;
            };

            let content = display_text(e, self.elements, &renderer.groups);
            if content.trim().is_empty() {
                continue;
            }

            let font_size = e.font_size.filter(|s| *s > 0.0).unwrap_or(DEFAULT_FONT_SIZE);
            let spec = font_spec(e, font_size * FONT_SIZE_SCALE);
            let line_height = spec.size * LINE_HEIGHT;
            let box_width = e.width.filter(|w| *w > 0.0).map(|w| w * TEXT_BOX_SCALE);

            let block = layout_block(
                &labelled_text(e, &content),
                box_width,
                Align::resolve(e.align.as_deref()),
                &spec,
                line_height,
                fonts,
            );
            let metrics = fonts.line_metrics(&spec);
            let baseline = (line_height + metrics.ascent - metrics.descent) / 2.0;

            let mut group = GroupNode::new(position.x, position.y);
            let icon = is_icon_label(e).then(|| IconKind::for_key(&e.key)).flatten();
            let text_x = match icon {
                Some(kind) => {
                    let icon_size = font_size * ICON_SCALE;
                    let icon_y = (block.height() - icon_size) / 2.0;
                    let color = Color::parse_or(e.color.as_deref(), DEFAULT_ICON_COLOR);
                    group.push(kind.render(block.lead_offset(), icon_y, icon_size, color));
                    icon_size + ICON_GAP
                }
                None => 0.0,
            };

            group.push(TextNode {
                x: text_x,
                y: 0.0,
                block,
                font: spec,
                color: Color::parse_or(e.color.as_deref(), DEFAULT_TEXT_COLOR),
                decoration: e.font_decoration_line.clone(),
                baseline,
            });
            placed.push((e.key.clone(), group));
        }

        for (key, group) in placed {
            self.scene.push(LayerKind::Text, Some(&key), group);
        }
    }
}

fn optional_stroke(e: &Element) -> Option<Stroke> {
    let color = e.stroke.as_deref().and_then(Color::parse)?;
    let width = e.stroke_width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_STROKE_WIDTH);
    Some(Stroke::new(color, width))
}

fn shape_node(e: &Element, shape: ShapeType) -> Option<Node> {
    match shape {
        ShapeType::Circle => {
            let p = e.position?;
            let fill = Color::parse_or(e.fill.as_deref(), DEFAULT_CIRCLE_FILL);
            Some(
                CircleNode {
                    cx: p.x,
                    cy: p.y,
                    radius: e.radius.filter(|r| *r > 0.0).unwrap_or(DEFAULT_CIRCLE_RADIUS),
                    paint: Paint::fill(fill).with_stroke(optional_stroke(e)),
                }
                .into(),
            )
        }
        ShapeType::Rect => {
            let p = e.position?;
            let (width, height) = (e.width?, e.height?);
            let fill = Color::parse_or(e.fill.as_deref(), DEFAULT_RECT_FILL);
            let paint = Paint::fill(fill).with_stroke(optional_stroke(e));
            Some(RectNode::new(p.x, p.y, width, height, paint).into())
        }
        ShapeType::Line => {
            let points = e.points.as_deref().filter(|p| p.len() >= 4)?;
            let color = Color::parse_or(e.stroke.as_deref(), DEFAULT_LINE_STROKE);
            let width = e.stroke_width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_STROKE_WIDTH);
            let paint = Paint::stroke(Stroke::new(color, width).rounded());
            Some(PolylineNode::from_flat(points, paint).into())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::SIGNATURE_NAME_KEY;
    use crate::error::RenderError;
    use crate::fonts::FontSpec;
    use image::{DynamicImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn renderer() -> SignatureRenderer {
        let config = RenderConfig::default();
        let fonts = Arc::new(FontRegistry::empty());
        SignatureRenderer::new(config, fonts).unwrap()
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Arc<AcquiredImage> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)));
        Arc::new(AcquiredImage::from_image(img).unwrap())
    }

    fn text_group<'a>(scene: &'a Scene, key: &str) -> &'a GroupNode {
        let entry = scene
            .layer(LayerKind::Text)
            .entries
            .iter()
            .find(|e| e.source.as_deref() == Some(key))
            .unwrap_or_else(|| panic!("no text for {key}"));
        match &entry.node {
            Node::Group(g) => g,
            other => panic!("unexpected node {other:?}"),
        }
    }

    fn text_node(group: &GroupNode) -> &TextNode {
        group
            .children
            .iter()
            .find_map(|n| match n {
                Node::Text(t) => Some(t),
                _ => None,
            })
            .unwrap()
    }

    fn joined(node: &TextNode) -> String {
        node.block.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn layers_follow_fixed_order_regardless_of_input() {
        let elements = vec![
            Element::new("email").with_value("a@x.com").at(10.0, 10.0),
            Element::new("qrCode").with_link("https://example.com").at(200.0, 20.0),
            Element::new("logo").with_value("inline").at(5.0, 5.0).sized(40.0, 20.0),
            Element::new("backgroundColor").with_value("#102030"),
        ];
        let images = ResolvedImages::new().with(2, solid(4, 2, [255, 0, 0, 255]));
        let scene = renderer().compose_with_images(&elements, &images).unwrap();

        let image_sources: Vec<&str> = scene.layer(LayerKind::Images).sources().collect();
        assert_eq!(image_sources, vec!["logo", "qrCode"]);
        let background_sources: Vec<&str> = scene.layer(LayerKind::Background).sources().collect();
        assert_eq!(background_sources, vec!["backgroundColor"]);
        assert!(scene.contains_key("email"));
    }

    #[test]
    fn hidden_elements_leave_no_trace() {
        let mut shape = Element::new("divider").at(0.0, 0.0).sized(10.0, 10.0).hidden();
        shape.shape_type = Some("rect".into());
        let elements = vec![
            Element::new("email").with_value("a@x.com").at(10.0, 10.0).hidden(),
            Element::new("qrCode").with_link("https://example.com").hidden(),
            Element::new("logo").with_value("inline").at(5.0, 5.0).hidden(),
            Element::new("backgroundColor").with_value("#000").hidden(),
            Element::new("customText-1").with_value("hi").at(1.0, 1.0).hidden(),
            shape,
        ];
        let images = ResolvedImages::new().with(2, solid(1, 1, [0, 0, 0, 255]));
        let scene = renderer().compose_with_images(&elements, &images).unwrap();

        for e in &elements {
            assert!(!scene.contains_key(&e.key), "{} left a trace", e.key);
        }
        // only the default white background remains
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn background_defaults_to_white_rounded_rect() {
        let scene = renderer().compose_with_images(&[], &ResolvedImages::new()).unwrap();
        let entry = &scene.layer(LayerKind::Background).entries[0];
        match &entry.node {
            Node::Rect(r) => {
                assert_eq!(r.paint.fill, Some(Color::WHITE));
                assert_eq!(r.corner_radius, 8.0);
                assert_eq!((r.width, r.height), (336.0, 192.0));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn background_image_replaces_colour() {
        let elements = vec![
            Element::new("backgroundColor").with_value("#ff0000"),
            Element::new("backgroundImage").with_link("inline"),
        ];
        let images = ResolvedImages::new().with(1, solid(2, 2, [0, 0, 255, 255]));
        let scene = renderer().compose_with_images(&elements, &images).unwrap();

        let background = scene.layer(LayerKind::Background);
        assert_eq!(background.len(), 1);
        assert!(matches!(
            &background.entries[0].node,
            Node::Image(i) if i.clip_radius == 8.0 && i.width == 336.0
        ));
    }

    #[test]
    fn unresolved_background_image_falls_back_to_colour() {
        let elements = vec![
            Element::new("backgroundColor").with_value("#ff0000"),
            Element::new("backgroundImage").with_link("http://127.0.0.1:1/bg.png"),
        ];
        let scene = renderer().compose_with_images(&elements, &ResolvedImages::new()).unwrap();
        let entry = &scene.layer(LayerKind::Background).entries[0];
        assert!(matches!(
            &entry.node,
            Node::Rect(r) if r.paint.fill == Some(Color::rgb(255, 0, 0))
        ));
    }

    #[test]
    fn profile_photo_is_clipped_logo_is_not() {
        let elements = vec![
            Element::new("profilePhoto").with_value("a").at(0.0, 0.0).sized(60.0, 60.0),
            Element::new("logo").with_value("b").at(100.0, 0.0).sized(80.0, 30.0),
        ];
        let images = ResolvedImages::new()
            .with(0, solid(2, 2, [0, 0, 0, 255]))
            .with(1, solid(2, 2, [0, 0, 0, 255]));
        let scene = renderer().compose_with_images(&elements, &images).unwrap();

        let radii: Vec<f32> = scene
            .layer(LayerKind::Images)
            .entries
            .iter()
            .map(|e| match &e.node {
                Node::Image(i) => i.clip_radius,
                _ => -1.0,
            })
            .collect();
        assert_eq!(radii, vec![30.0, 0.0]);
    }

    #[test]
    fn shapes_use_defaults_and_skip_malformed() {
        let shape = |key: &str, kind: &str| {
            let mut e = Element::new(key);
            e.shape_type = Some(kind.into());
            e
        };
        let mut line = shape("line", "line");
        line.points = Some(vec![0.0, 0.0, 50.0, 0.0]);
        let elements = vec![
            shape("dot", "circle").at(20.0, 20.0),
            shape("box", "rect").at(0.0, 0.0),
            shape("broken", "line"),
            line,
            shape("odd", "triangle").at(1.0, 1.0),
        ];
        let scene = renderer().compose_with_images(&elements, &ResolvedImages::new()).unwrap();

        let shapes = scene.layer(LayerKind::Shapes);
        assert_eq!(shapes.sources().collect::<Vec<_>>(), vec!["dot", "line"]);
        match &shapes.entries[0].node {
            Node::Circle(c) => {
                assert_eq!(c.radius, DEFAULT_CIRCLE_RADIUS);
                assert_eq!(c.paint.fill, Some(DEFAULT_CIRCLE_FILL));
            }
            other => panic!("unexpected node {other:?}"),
        }
        match &shapes.entries[1].node {
            Node::Polyline(p) => {
                let stroke = p.paint.stroke.unwrap();
                assert_eq!(stroke.color, Color::BLACK);
                assert_eq!(stroke.width, 1.0);
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn composite_text_skips_hidden_children() {
        let groups = GroupTable::default().with_group("email", ["email0", "email1"]);
        let r = renderer().with_groups(groups);
        let elements = vec![
            Element::new("email").at(10.0, 10.0).sized(200.0, 20.0),
            Element::new("email0").with_value("a@x.com").at(0.0, 0.0),
            Element::new("email1").with_value("b@x.com").at(0.0, 0.0).hidden(),
        ];
        let scene = r.compose_with_images(&elements, &ResolvedImages::new()).unwrap();

        assert_eq!(joined(text_node(text_group(&scene, "email"))), "a@x.com");
        assert!(!scene.contains_key("email0"));
        assert_eq!(scene.layer(LayerKind::Text).len(), 1);
    }

    #[test]
    fn full_name_renders_its_own_value() {
        let elements = vec![
            Element::new("fullName").with_value("Dr. Jane Doe").at(10.0, 10.0).sized(300.0, 20.0),
            Element::new("prefix").with_value("Dr"),
            Element::new("firstName").with_value("Jane"),
            Element::new("lastName").with_value("Doe"),
        ];
        let scene = renderer().compose_with_images(&elements, &ResolvedImages::new()).unwrap();
        assert_eq!(joined(text_node(text_group(&scene, "fullName"))), "Dr. Jane Doe");
    }

    #[test]
    fn label_prefix_and_text_styling() {
        let mut mobile = Element::new("mobileNumber")
            .with_value("+1 555")
            .at(0.0, 0.0)
            .sized(300.0, 20.0);
        mobile.label = Some("M".into());
        mobile.font_size = Some(10.0);
        mobile.color = Some("#112233".into());
        let scene = renderer().compose_with_images(&[mobile], &ResolvedImages::new()).unwrap();

        let text = text_node(text_group(&scene, "mobileNumber"));
        assert_eq!(joined(text), "M : +1 555");
        assert_eq!(text.color, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(text.font, FontSpec::new("Arial", 8.2));
        assert_eq!(text.block.line_height, 8.2 * LINE_HEIGHT);
        assert_eq!(text.block.box_width, 300.0 * TEXT_BOX_SCALE);
    }

    #[test]
    fn icon_tracks_centre_alignment() {
        let mut email = Element::new("email")
            .with_value("a@x.com")
            .at(10.0, 40.0)
            .sized(100.0, 20.0);
        email.label = Some("ICON".into());
        email.align = Some("center".into());
        email.font_size = Some(10.0);
        let r = renderer();
        let scene = r.compose_with_images(&[email], &ResolvedImages::new()).unwrap();

        let group = text_group(&scene, "email");
        let text = text_node(group);
        let Node::Group(icon) = &group.children[0] else {
            panic!("icon should be drawn first");
        };

        let glyph_width = r.fonts().measure("a@x.com", &text.font);
        let expected = (100.0 * TEXT_BOX_SCALE - glyph_width) / 2.0;
        assert!((icon.x - expected).abs() < 1e-4);
        assert!((text.block.lines[0].x - expected).abs() < 1e-4);

        let icon_size = 10.0 * ICON_SCALE;
        assert!((icon.scale - icon_size / 512.0).abs() < 1e-6);
        assert!((icon.y - (text.height() - icon_size) / 2.0).abs() < 1e-4);
        assert_eq!(text.x, icon_size + ICON_GAP);
    }

    #[test]
    fn icon_tracks_right_alignment() {
        let mut fax = Element::new("fax")
            .with_value("+1 555 0100")
            .at(0.0, 0.0)
            .sized(120.0, 20.0);
        fax.label = Some("ICON".into());
        fax.align = Some("right".into());
        fax.font_size = Some(10.0);
        let r = renderer();
        let scene = r.compose_with_images(&[fax], &ResolvedImages::new()).unwrap();

        let group = text_group(&scene, "fax");
        let text = text_node(group);
        let Node::Group(icon) = &group.children[0] else {
            panic!("icon should be drawn first");
        };

        let glyph_width = r.fonts().measure("+1 555 0100", &text.font);
        let expected = 120.0 * TEXT_BOX_SCALE - glyph_width;
        assert!(expected > 0.0);
        assert!((icon.x - expected).abs() < 1e-4);
        assert!((text.block.lines[0].x - expected).abs() < 1e-4);
    }

    #[test]
    fn control_characters_in_text_do_not_abort_render() {
        let elements = vec![
            Element::new("companyName")
                .with_value("Acme\u{000B}Corp")
                .at(10.0, 10.0)
                .sized(200.0, 20.0),
            Element::new("designation")
                .with_value("CTO")
                .at(10.0, 40.0)
                .sized(200.0, 20.0),
        ];
        let r = renderer();
        let scene = r.compose_with_images(&elements, &ResolvedImages::new()).unwrap();
        assert!(scene.contains_key("companyName"));
        assert!(scene.contains_key("designation"));

        let png = r.render_with_images(&elements, &ResolvedImages::new()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1008, 576));
    }

    #[test]
    fn icon_label_without_glyph_draws_text_only() {
        let mut company = Element::new("companyName").with_value("Acme").at(0.0, 0.0);
        company.label = Some("ICON".into());
        let scene = renderer().compose_with_images(&[company], &ResolvedImages::new()).unwrap();

        let group = text_group(&scene, "companyName");
        assert_eq!(group.children.len(), 1);
        assert_eq!(text_node(group).x, 0.0);
    }

    #[test]
    fn inert_and_unpositioned_fields_are_not_text() {
        let elements = vec![
            Element::new(SIGNATURE_NAME_KEY).with_value("Main").at(0.0, 0.0).sized(350.0, 200.0),
            Element::new("social-linkedin").with_value("https://linkedin.com/x").at(0.0, 0.0),
            Element::new("disclaimer").with_value("Confidential").at(0.0, 0.0),
            Element::new("firstName").with_value("Jane").at(0.0, 0.0),
            Element::new("designation").with_value("CTO"),
            Element::new("customText-1").with_value("   ").at(0.0, 0.0),
        ];
        let scene = renderer().compose_with_images(&elements, &ResolvedImages::new()).unwrap();
        assert!(scene.layer(LayerKind::Text).is_empty());
        assert_eq!(scene.canvas, CanvasSize { width: 336, height: 192 });
    }

    #[test]
    fn qr_without_link_uses_placeholder_and_fixed_size() {
        let elements = vec![Element::new("qrCode").at(250.0, 100.0)];
        let scene = renderer().compose_with_images(&elements, &ResolvedImages::new()).unwrap();

        let entry = &scene.layer(LayerKind::Images).entries[0];
        let Node::Group(group) = &entry.node else {
            panic!("qr should be a group");
        };
        assert_eq!((group.x, group.y), (250.0, 100.0));
        let matrix = qr::ModuleMatrix::encode(qr::PLACEHOLDER).unwrap();
        let expected = qr::QrGeometry::new(matrix.width(), 80);
        assert!(matches!(&group.children[0], Node::Rect(r) if r.width == expected.size as f32));
    }

    #[test]
    fn qr_encoding_failure_aborts_render() {
        let elements = vec![Element::new("qrCode").with_link("x".repeat(4000)).at(0.0, 0.0)];
        let result = renderer().compose_with_images(&elements, &ResolvedImages::new());
        assert!(matches!(result, Err(RenderError::QrEncode(_))));
    }

    #[tokio::test]
    async fn unreachable_logo_is_omitted() {
        let elements = vec![
            Element::new("logo")
                .with_link("http://127.0.0.1:1/logo.png")
                .at(0.0, 0.0)
                .sized(40.0, 40.0),
            Element::new("companyName").with_value("Acme").at(50.0, 10.0).sized(100.0, 20.0),
        ];
        let r = renderer();
        let scene = r.compose(&elements).await.unwrap();
        assert!(scene.layer(LayerKind::Images).is_empty());
        assert!(scene.contains_key("companyName"));

        let png = r.render(&elements).await.unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1008, 576));
    }

    #[tokio::test]
    async fn inline_logo_is_acquired_and_drawn() {
        let green = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        let bytes = crate::export::encode_png(&green).unwrap();
        let uri = format!(
            "data:image/png;base64,{}",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes)
        );
        let elements = vec![Element::new("logo").with_value(uri).at(0.0, 0.0).sized(20.0, 20.0)];

        let r = renderer();
        let images = r.acquire_images(&elements).await;
        assert_eq!(images.len(), 1);

        let png = r.render_with_images(&elements, &images).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(30, 30).0, [0, 255, 0, 255]);
    }
}
