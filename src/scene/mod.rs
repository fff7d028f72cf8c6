//! The layered scene built for a single render.
//!
//! A [`Scene`] holds four fixed-order layers. Each layer is an ordered list of
//! draw nodes; every node optionally remembers the key of the element it was
//! built from so callers can check which elements left a trace.
//!
//! # Architecture
//!
//! The compositor only ever appends nodes. Rasterization lives in [`svg`],
//! which serializes the tree and hands it to resvg.

pub mod paint;
pub mod svg;

pub use paint::{Color, LineCap, LineJoin, Paint, Stroke};

use std::sync::Arc;

use crate::fonts::FontSpec;
use crate::layout::CanvasSize;
use crate::text::TextBlock;

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RectNode {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub paint: Paint,
}

impl RectNode {
    pub fn new(x: f32, y: f32, width: f32, height: f32, paint: Paint) -> Self {
        Self {
            x,
            y,
            width,
            height,
            corner_radius: 0.0,
            paint,
        }
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleNode {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub paint: Paint,
}

/// An open polyline through `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineNode {
    pub points: Vec<(f32, f32)>,
    pub paint: Paint,
}

impl PolylineNode {
    /// Pairs up a flat `[x0, y0, x1, y1, ...]` list; a trailing odd value is
    /// ignored.
    pub fn from_flat(flat: &[f32], paint: Paint) -> Self {
        let points = flat.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        Self { points, paint }
    }
}

/// SVG path data in the node's local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub data: String,
    pub paint: Paint,
}

/// A decoded raster placed in a box and stretched to fill it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Corner radius of the clip; zero draws the image unclipped.
    pub clip_radius: f32,
    /// PNG-encoded pixels.
    pub png: Arc<[u8]>,
}

/// A laid-out text block whose top-left corner sits at (`x`, `y`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub x: f32,
    pub y: f32,
    pub block: TextBlock,
    pub font: FontSpec,
    pub color: Color,
    /// CSS `text-decoration` value such as `underline`.
    pub decoration: Option<String>,
    /// Distance from the top of each line box to its baseline.
    pub baseline: f32,
}

impl TextNode {
    pub fn height(&self) -> f32 {
        self.block.height()
    }
}

/// Children translated by (`x`, `y`) and uniformly scaled by `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub children: Vec<Node>,
}

impl GroupNode {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            scale: 1.0,
            children: Vec::new(),
        }
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rect(RectNode),
    Circle(CircleNode),
    Polyline(PolylineNode),
    Path(PathNode),
    Image(ImageNode),
    Text(TextNode),
    Group(GroupNode),
}

impl Node {
    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        match self {
            Self::Group(g) => 1 + g.children.iter().map(Node::count).sum::<usize>(),
            _ => 1,
        }
    }
}

macro_rules! impl_into_node {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Node {
            fn from(node: $ty) -> Self {
                Self::$variant(node)
            }
        })*
    };
}

impl_into_node! {
    RectNode => Rect,
    CircleNode => Circle,
    PolylineNode => Polyline,
    PathNode => Path,
    ImageNode => Image,
    TextNode => Text,
    GroupNode => Group,
}

// ============================================================================
// Layers
// ============================================================================

/// The four layers in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Background,
    Shapes,
    Images,
    Text,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [Self::Background, Self::Shapes, Self::Images, Self::Text];

    fn index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Shapes => 1,
            Self::Images => 2,
            Self::Text => 3,
        }
    }
}

/// A node with the key of the element that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub source: Option<String>,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub entries: Vec<Entry>,
}

impl Layer {
    fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.source.as_deref())
    }
}

// ============================================================================
// Scene
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub canvas: CanvasSize,
    layers: [Layer; 4],
}

impl Scene {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            layers: LayerKind::ALL.map(Layer::new),
        }
    }

    /// Appends `node` to the end of `kind`'s layer.
    pub fn push(&mut self, kind: LayerKind, source: Option<&str>, node: impl Into<Node>) {
        self.layers[kind.index()].entries.push(Entry {
            source: source.map(str::to_string),
            node: node.into(),
        });
    }

    pub fn layer(&self, kind: LayerKind) -> &Layer {
        &self.layers[kind.index()]
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Whether any layer holds a node built from element `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.layers.iter().any(|l| l.sources().any(|s| s == key))
    }

    /// Total nodes across all layers, group children included.
    pub fn node_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| &l.entries)
            .map(|e| e.node.count())
            .sum()
    }
}
