//! Vector glyphs drawn next to icon-labelled text fields.
//!
//! Each glyph is defined once in its own fixed coordinate box (512 units,
//! or 24 for the landline handset) and uniformly scaled into the requested
//! size. Rendering is pure: the same arguments always build the same tree.

use crate::scene::{
    CircleNode, Color, GroupNode, LineCap, LineJoin, Paint, PathNode, PolylineNode, RectNode,
    Stroke,
};

/// Icon size relative to the field's font size.
pub const ICON_SCALE: f32 = 1.3;

/// Gap between the icon box and the text that follows it.
pub const ICON_GAP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Email,
    Fax,
    Website,
    Location,
    Mobile,
    Landline,
}

impl IconKind {
    pub const ALL: [IconKind; 6] = [
        Self::Email,
        Self::Fax,
        Self::Website,
        Self::Location,
        Self::Mobile,
        Self::Landline,
    ];

    /// The glyph drawn for a composite field key, if any.
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            "email" => Some(Self::Email),
            "fax" => Some(Self::Fax),
            "website" => Some(Self::Website),
            "addressLine1" => Some(Self::Location),
            "mobileNumber" => Some(Self::Mobile),
            "landlineNumber" => Some(Self::Landline),
            _ => None,
        }
    }

    /// Side of the square coordinate box the glyph is authored in.
    pub fn view_box(self) -> f32 {
        match self {
            Self::Landline => 24.0,
            _ => 512.0,
        }
    }

    /// Builds the glyph with its top-left corner at (`x`, `y`), scaled to a
    /// `size` x `size` box.
    pub fn render(self, x: f32, y: f32, size: f32, color: Color) -> GroupNode {
        let mut group = GroupNode::new(x, y).scaled(size / self.view_box());
        match self {
            Self::Email => email(&mut group, color),
            Self::Fax => fax(&mut group, color),
            Self::Website => website(&mut group, color),
            Self::Location => location(&mut group, color),
            Self::Mobile => mobile(&mut group, color),
            Self::Landline => landline(&mut group, color),
        }
        group
    }
}

fn outline(color: Color, width: f32) -> Paint {
    Paint::stroke(Stroke::new(color, width))
}

fn rounded_line(color: Color, width: f32) -> Paint {
    Paint::stroke(Stroke::new(color, width).rounded())
}

fn email(g: &mut GroupNode, color: Color) {
    // envelope
    g.push(RectNode::new(56.0, 120.0, 400.0, 272.0, outline(color, 24.0)).with_corner_radius(36.0));
    // flap
    g.push(PolylineNode::from_flat(
        &[80.0, 140.0, 256.0, 290.0, 432.0, 140.0],
        rounded_line(color, 22.0),
    ));
    let mut diagonal = Stroke::new(color, 22.0);
    diagonal.cap = LineCap::Round;
    g.push(PolylineNode::from_flat(&[80.0, 380.0, 210.0, 260.0], Paint::stroke(diagonal)));
    g.push(PolylineNode::from_flat(&[430.0, 380.0, 300.0, 260.0], Paint::stroke(diagonal)));
}

const FAX_BODY: &str = "M429.684 163.714V78.711L350.958 0h-4.916h-179.11v148.673\
c-12.768-10.612-29.068-17.136-46.961-17.136h-16.586\
c-20.396-0.015-38.776 8.324-51.953 21.734\
C38.239 166.674 30.162 185.2 30.17 205.55v221.216\
c0.008 47.015 38.219 85.218 85.235 85.234h281.192\
c47.015-0.016 85.219-38.219 85.234-85.234V242.262\
c-0.015-35.29-21.533-65.611-52.147-78.548z";

const FAX_KEYS: [(f32, f32); 9] = [
    (236.98, 386.908),
    (316.131, 386.908),
    (395.283, 386.908),
    (236.98, 336.771),
    (316.131, 336.771),
    (395.283, 336.771),
    (236.98, 286.649),
    (316.131, 286.649),
    (395.283, 286.649),
];

fn fax(g: &mut GroupNode, color: Color) {
    g.push(PathNode {
        data: FAX_BODY.to_string(),
        paint: Paint::fill(color),
    });
    for (cx, cy) in FAX_KEYS {
        g.push(CircleNode {
            cx,
            cy,
            radius: 15.38,
            paint: Paint::fill(color),
        });
    }
    // paper slot
    g.push(
        RectNode::new(237.768, 231.696, 158.288, 31.658, Paint::fill(color))
            .with_corner_radius(15.829),
    );
}

fn website(g: &mut GroupNode, color: Color) {
    g.push(CircleNode {
        cx: 256.0,
        cy: 256.0,
        radius: 200.0,
        paint: outline(color, 24.0),
    });
    // meridians
    g.push(PathNode {
        data: "M256 56C176 136 176 376 256 456M256 56C336 136 336 376 256 456".to_string(),
        paint: rounded_line(color, 22.0),
    });
    // equator and parallels
    g.push(PolylineNode::from_flat(&[56.0, 256.0, 456.0, 256.0], rounded_line(color, 22.0)));
    g.push(PolylineNode::from_flat(&[90.0, 166.0, 422.0, 166.0], rounded_line(color, 18.0)));
    g.push(PolylineNode::from_flat(&[90.0, 346.0, 422.0, 346.0], rounded_line(color, 18.0)));
}

fn location(g: &mut GroupNode, color: Color) {
    g.push(PathNode {
        data: PIN.to_string(),
        paint: Paint::stroke(Stroke::new(color, 26.0).with_join(LineJoin::Round)),
    });
    g.push(CircleNode {
        cx: 256.0,
        cy: 200.0,
        radius: 70.0,
        paint: outline(color, 26.0),
    });
}

fn mobile(g: &mut GroupNode, color: Color) {
    // body
    g.push(RectNode::new(136.0, 40.0, 240.0, 432.0, outline(color, 22.0)).with_corner_radius(36.0));
    // screen
    g.push(
        RectNode::new(160.0, 92.0, 192.0, 300.0, outline(color, 18.0).with_opacity(0.9))
            .with_corner_radius(18.0),
    );
    // speaker
    g.push(
        RectNode::new(215.0, 62.0, 82.0, 16.0, Paint::fill(color).with_opacity(0.7))
            .with_corner_radius(8.0),
    );
    // home button
    g.push(RectNode::new(214.0, 412.0, 84.0, 32.0, outline(color, 16.0)).with_corner_radius(16.0));
}

const PIN: &str = "M256 40C166 40 96 110 96 200C96 310 256 472 256 472\
C256 472 416 310 416 200C416 110 346 40 256 40Z";

const HANDSET: &str = "M21 16.5V20C21 20.55 20.55 21 20 21C9.95 21 3 14.05 3 4\
C3 3.45 3.45 3 4 3H7.5\
C8.05 3 8.5 3.45 8.5 4C8.5 5.1 8.67 6.15 9 7.15C9.13 7.56 9.03 8.01 8.73 8.31L7 10.05\
C8.35 12.85 11.15 15.65 13.95 17L15.69 15.27C15.99 14.97 16.44 14.87 16.85 15\
C17.85 15.33 18.9 15.5 20 15.5C20.55 15.5 21 15.95 21 16.5Z";

fn landline(g: &mut GroupNode, color: Color) {
    g.push(PathNode {
        data: HANDSET.to_string(),
        paint: rounded_line(color, 1.5),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CanvasSize;
    use crate::scene::svg::rasterize;
    use crate::fonts::FontRegistry;
    use crate::scene::{LayerKind, Node, Scene};

    #[test]
    fn keys_map_to_glyphs() {
        assert_eq!(IconKind::for_key("email"), Some(IconKind::Email));
        assert_eq!(IconKind::for_key("addressLine1"), Some(IconKind::Location));
        assert_eq!(IconKind::for_key("landlineNumber"), Some(IconKind::Landline));
        assert_eq!(IconKind::for_key("companyName"), None);
    }

    #[test]
    fn rendering_is_deterministic() {
        for kind in IconKind::ALL {
            let a = kind.render(3.0, 4.0, 15.6, Color::BLACK);
            let b = kind.render(3.0, 4.0, 15.6, Color::BLACK);
            assert_eq!(a, b, "{kind:?}");
            assert!(!a.children.is_empty());
        }
    }

    #[test]
    fn scale_follows_view_box() {
        let mail = IconKind::Email.render(0.0, 0.0, 256.0, Color::BLACK);
        assert_eq!(mail.scale, 0.5);

        let phone = IconKind::Landline.render(0.0, 0.0, 12.0, Color::BLACK);
        assert_eq!(phone.scale, 0.5);
        assert!(matches!(phone.children[0], Node::Path(_)));
    }

    #[test]
    fn glyphs_stay_inside_their_box() {
        for kind in IconKind::ALL {
            let mut scene = Scene::new(CanvasSize { width: 64, height: 64 });
            scene.push(LayerKind::Images, None, kind.render(16.0, 16.0, 32.0, Color::BLACK));
            let img = rasterize(&scene, 1.0, &FontRegistry::empty()).unwrap();

            let inked = img.enumerate_pixels().filter(|(_, _, p)| p[3] > 0).count();
            assert!(inked > 0, "{kind:?} drew nothing");
            for (x, y, p) in img.enumerate_pixels() {
                if p[3] > 0 {
                    assert!(
                        (14..50).contains(&x) && (14..50).contains(&y),
                        "{kind:?} ink at {x},{y}"
                    );
                }
            }
        }
    }
}
