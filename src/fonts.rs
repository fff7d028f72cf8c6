//! Font registration and text measurement.
//!
//! [`FontRegistry::initialize`] is called once by the process entry point.
//! It scans font directories, normalizes family names taken from file names
//! and registers each (family, weight, style) triple once. The resulting
//! database is shared with the rasterizer so that measurement and drawing
//! resolve the same faces.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use resvg::usvg::fontdb;

/// Advance used when no face resolves, in ems.
const FALLBACK_ADVANCE: f32 = 0.55;
const FALLBACK_ASCENT: f32 = 0.8;
const FALLBACK_DESCENT: f32 = 0.2;

// ============================================================================
// FontSpec
// ============================================================================

/// A resolved font request: family, size and CSS weight/style.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: 400,
            italic: false,
        }
    }

    /// The `"<weight> <style>"` string, e.g. `"700 italic"`.
    pub fn style_string(&self) -> String {
        format!("{} {}", self.weight, if self.italic { "italic" } else { "normal" })
    }

    fn query_style(&self) -> fontdb::Style {
        if self.italic {
            fontdb::Style::Italic
        } else {
            fontdb::Style::Normal
        }
    }
}

/// Vertical metrics of a line at a given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    /// Positive distance below the baseline.
    pub descent: f32,
}

// ============================================================================
// File-name normalization
// ============================================================================

/// Family, weight and style derived from a font file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceIdentity {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
}

impl FaceIdentity {
    /// Derives the identity of `file_name` (`book_antiqua_bolditalic.ttf`
    /// becomes "Book Antiqua", 700, italic). Every `arial*` file folds into
    /// the single "Arial" family.
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();

        let weight = if lower.contains("black") {
            900
        } else if lower.contains("bold") {
            700
        } else {
            400
        };
        let italic = lower.contains("italic");

        Self {
            family: normalize_family(file_name),
            weight,
            italic,
        }
    }
}

fn normalize_family(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    if lower.starts_with("arial") {
        return "Arial".to_string();
    }

    let stem = strip_font_extension(file_name);
    let mut name = stem.to_string();
    for keyword in ["bolditalic", "bold", "italic", "black", "regular"] {
        name = remove_keyword(&name, keyword);
    }

    name.replace('_', " ")
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_font_extension(file_name: &str) -> &str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".ttf") || lower.ends_with(".otf") {
        &file_name[..file_name.len() - 4]
    } else {
        file_name
    }
}

/// Removes the first case-insensitive occurrence of `keyword`, together with
/// one preceding `-` or `_`.
fn remove_keyword(name: &str, keyword: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let Some(start) = lower.find(keyword) else {
        return name.to_string();
    };
    let end = start + keyword.len();
    let start = if start > 0 && matches!(name.as_bytes()[start - 1], b'-' | b'_') {
        start - 1
    } else {
        start
    };
    format!("{}{}", &name[..start], &name[end..])
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

// ============================================================================
// FontRegistry
// ============================================================================

/// Process-wide font database plus a cache of parsed faces for measurement.
///
/// Read-only after [`initialize`](Self::initialize); clone the [`Arc`]
/// returned by [`database`](Self::database) to hand faces to the rasterizer.
pub struct FontRegistry {
    db: Arc<fontdb::Database>,
    faces: RwLock<HashMap<fontdb::ID, Option<Arc<FontVec>>>>,
    families: Vec<FaceIdentity>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("faces", &self.db.len())
            .field("families", &self.families)
            .finish()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontRegistry {
    /// A registry with no faces; all measurement uses the fixed estimate.
    pub fn empty() -> Self {
        Self::from_database(fontdb::Database::new(), Vec::new())
    }

    /// Scans `dirs` and registers every `.ttf`/`.otf` file found directly
    /// inside them. Unreadable directories and invalid files are skipped.
    ///
    /// `fallback_family` becomes the generic sans-serif family when it was
    /// registered.
    pub fn initialize<P: AsRef<Path>>(dirs: &[P], fallback_family: &str) -> Self {
        let mut db = fontdb::Database::new();
        let mut registered: Vec<FaceIdentity> = Vec::new();

        for dir in dirs {
            for path in font_files(dir.as_ref()) {
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let identity = FaceIdentity::from_file_name(file_name);
                if registered.contains(&identity) {
                    log::debug!("skipping duplicate font {} ({:?})", path.display(), identity);
                    continue;
                }

                match fs::read(&path) {
                    Ok(data) => {
                        if register_face(&mut db, data, &identity) {
                            log::info!(
                                "registered font {} ({} {})",
                                identity.family,
                                identity.weight,
                                if identity.italic { "italic" } else { "normal" }
                            );
                            registered.push(identity);
                        } else {
                            log::warn!("skipping invalid font file {}", path.display());
                        }
                    }
                    Err(e) => log::warn!("cannot read font {}: {}", path.display(), e),
                }
            }
        }

        if registered.iter().any(|f| f.family == fallback_family) {
            db.set_sans_serif_family(fallback_family);
        }

        Self::from_database(db, registered)
    }

    /// Wraps an already populated database (for example one that also
    /// loaded system fonts).
    pub fn from_database(db: fontdb::Database, families: Vec<FaceIdentity>) -> Self {
        Self {
            db: Arc::new(db),
            faces: RwLock::new(HashMap::new()),
            families,
        }
    }

    /// Shared handle to the underlying database.
    pub fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }

    /// Identities registered by [`initialize`](Self::initialize), in order.
    pub fn registered(&self) -> &[FaceIdentity] {
        &self.families
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Finds the face for `spec`: the named family first, the generic
    /// sans-serif family otherwise.
    pub fn resolve(&self, spec: &FontSpec) -> Option<fontdb::ID> {
        let query = |families: &[fontdb::Family<'_>]| {
            self.db.query(&fontdb::Query {
                families,
                weight: fontdb::Weight(spec.weight),
                stretch: fontdb::Stretch::Normal,
                style: spec.query_style(),
            })
        };
        query(&[fontdb::Family::Name(&spec.family)]).or_else(|| query(&[fontdb::Family::SansSerif]))
    }

    /// Family name that will actually be drawn for `spec`, if any face resolves.
    pub fn resolved_family(&self, spec: &FontSpec) -> Option<String> {
        let id = self.resolve(spec)?;
        let face = self.db.face(id)?;
        face.families.first().map(|(name, _)| name.clone())
    }

    /// Advance width of `text` on one line, kerning included.
    pub fn measure(&self, text: &str, spec: &FontSpec) -> f32 {
        let Some(font) = self.face_for(spec) else {
            return text.chars().count() as f32 * spec.size * FALLBACK_ADVANCE;
        };

        let scaled = font.as_scaled(px_scale(&font, spec.size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let glyph = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph);
            }
            width += scaled.h_advance(glyph);
            previous = Some(glyph);
        }
        width
    }

    pub fn line_metrics(&self, spec: &FontSpec) -> LineMetrics {
        match self.face_for(spec) {
            Some(font) => {
                let scaled = font.as_scaled(px_scale(&font, spec.size));
                LineMetrics {
                    ascent: scaled.ascent(),
                    descent: -scaled.descent(),
                }
            }
            None => LineMetrics {
                ascent: spec.size * FALLBACK_ASCENT,
                descent: spec.size * FALLBACK_DESCENT,
            },
        }
    }

    fn face_for(&self, spec: &FontSpec) -> Option<Arc<FontVec>> {
        let id = self.resolve(spec)?;

        if let Some(cached) = self
            .faces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return cached.clone();
        }

        let parsed = self
            .db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
            })
            .flatten()
            .map(Arc::new);

        self.faces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, parsed.clone());
        parsed
    }
}

/// Scale such that one em equals `size` pixels.
fn px_scale(font: &FontVec, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

fn font_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("font directory {} unavailable: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_font_file(p))
        .collect();
    files.sort();
    files
}

/// Loads `data` and re-labels its faces with the normalized identity.
/// Returns false when the data holds no parsable face.
fn register_face(db: &mut fontdb::Database, data: Vec<u8>, identity: &FaceIdentity) -> bool {
    let source = fontdb::Source::Binary(Arc::new(data));
    let ids = db.load_font_source(source);
    if ids.is_empty() {
        return false;
    }

    for id in ids {
        let Some(mut info) = db.face(id).cloned() else {
            continue;
        };
        db.remove_face(id);

        let mut families = vec![(identity.family.clone(), fontdb::Language::English_UnitedStates)];
        families.extend(info.families.into_iter().filter(|(name, _)| *name != identity.family));
        info.families = families;
        info.weight = fontdb::Weight(identity.weight);
        info.style = if identity.italic {
            fontdb::Style::Italic
        } else {
            fontdb::Style::Normal
        };
        db.push_face_info(info);
    }
    true
}
