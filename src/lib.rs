//! signature-renderer: deterministic email-signature rasterizer
//!
//! This crate turns a list of positioned elements (text fields, icons,
//! images, shapes, a QR code and a background) into a single PNG. Rendering
//! happens in four fixed layers: background, shapes, images, text.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use signature_renderer::{
//!     Element, FontRegistry, LayerKind, RenderConfig, ResolvedImages, SignatureRenderer,
//! };
//!
//! let fonts = Arc::new(FontRegistry::empty());
//! let renderer = SignatureRenderer::new(RenderConfig::default(), fonts)?;
//!
//! let elements = vec![
//!     Element::new("backgroundColor").with_value("#0b2e79"),
//!     Element::new("fullName").with_value("Jane Doe").at(20.0, 24.0).sized(200.0, 20.0),
//!     Element::new("qrCode").with_link("https://example.com").at(240.0, 96.0),
//! ];
//!
//! let scene = renderer.compose_with_images(&elements, &ResolvedImages::new())?;
//! assert_eq!(scene.layer(LayerKind::Images).len(), 1);
//!
//! let png = renderer.render_with_images(&elements, &ResolvedImages::new())?;
//! assert_eq!(&png[1..4], b"PNG");
//! # Ok::<(), signature_renderer::RenderError>(())
//! ```
//!
//! # Images
//!
//! Image-bearing elements are resolved concurrently through a shared
//! [`ImageAcquirer`] before composition; use [`SignatureRenderer::render`]
//! to acquire and render in one call.

mod acquire;
mod compositor;
mod config;
mod element;
mod error;
mod export;
mod fonts;
mod icon;
mod layout;
pub mod qr;
pub mod scene;
mod text;

pub use acquire::{
    AcquiredImage, DEFAULT_CACHE_CAPACITY, DEFAULT_LOCAL_HOSTS, EvictionPolicy, INLINE_PREFIX,
    ImageAcquirer, ImageCache,
};
pub use compositor::{ResolvedImages, SignatureRenderer};
pub use config::RenderConfig;
pub use element::{
    AssetRole, BackgroundRole, Element, ElementKind, FontWeightValue, Position, RenderRequest,
    ShapeType,
};
pub use error::{RenderError, Result};
pub use export::{encode_png, export_png};
pub use fonts::{FaceIdentity, FontRegistry, FontSpec, LineMetrics};
pub use icon::IconKind;
pub use layout::{
    BASE_WIDTH, CanvasSize, FALLBACK_RATIO, aspect_ratio, resolve_canvas, resolve_canvas_with,
};
pub use scene::{LayerKind, Scene};
pub use text::{
    Align, GroupTable, TextBlock, TextLine, display_text, layout_block, resolve_font_style,
};
