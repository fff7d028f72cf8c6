//! Serializable renderer configuration.
//!
//! A [`RenderConfig`] captures every tunable of the pipeline in a JSON-friendly
//! format. All fields have defaults, so `{}` is a valid configuration.
//!
//! # Example
//!
//! ```
//! use signature_renderer::{EvictionPolicy, RenderConfig};
//!
//! let config = RenderConfig::new()
//!     .with_export_scale(2.0)
//!     .with_public_base_url("https://api.example.com")
//!     .with_eviction(EvictionPolicy::Lru);
//!
//! let json = config.to_json().unwrap();
//! let restored = RenderConfig::from_json(&json).unwrap();
//! assert_eq!(restored.export_scale, 2.0);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::acquire::{DEFAULT_CACHE_CAPACITY, DEFAULT_LOCAL_HOSTS, EvictionPolicy};
use crate::layout::{BASE_WIDTH, FALLBACK_RATIO};

/// Environment variable holding the public base URL for local-host rewrites.
pub const ENV_PUBLIC_BASE_URL: &str = "API_URL";

/// Environment variable holding a path-separated list of font directories.
pub const ENV_FONT_DIRS: &str = "SIGNATURE_FONT_DIRS";

/// Pixel density of the exported bitmap relative to the logical layout.
pub const DEFAULT_EXPORT_SCALE: f32 = 3.0;

/// Display size of the QR code in logical units.
pub const DEFAULT_QR_SIZE: u32 = 80;

/// Corner radius of the canvas background.
pub const DEFAULT_BACKGROUND_RADIUS: f32 = 8.0;

pub const DEFAULT_FALLBACK_FONT: &str = "Arial";

// ============================================================================
// RenderConfig
// ============================================================================

/// Pipeline settings shared by every render of one renderer.
///
/// # JSON Format
///
/// ```json
/// {
///   "baseWidth": 336.0,
///   "fallbackRatio": 1.75,
///   "exportScale": 3.0,
///   "qrSize": 80,
///   "publicBaseUrl": "https://api.example.com",
///   "eviction": "lru",
///   "fontDirectories": ["/srv/fonts"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Logical canvas width.
    pub base_width: f32,

    /// Width / height used when no sizing hint is present.
    pub fallback_ratio: f32,

    pub export_scale: f32,

    pub qr_size: u32,

    pub background_corner_radius: f32,

    /// Replacement for development hosts in image URLs. Rewrites are skipped
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    pub local_hosts: Vec<String>,

    pub image_cache_capacity: usize,

    pub eviction: EvictionPolicy,

    pub font_directories: Vec<PathBuf>,

    /// Family used as the generic sans-serif fallback when registered.
    pub fallback_font_family: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_width: BASE_WIDTH,
            fallback_ratio: FALLBACK_RATIO,
            export_scale: DEFAULT_EXPORT_SCALE,
            qr_size: DEFAULT_QR_SIZE,
            background_corner_radius: DEFAULT_BACKGROUND_RADIUS,
            public_base_url: None,
            local_hosts: DEFAULT_LOCAL_HOSTS.iter().map(|h| h.to_string()).collect(),
            image_cache_capacity: DEFAULT_CACHE_CAPACITY,
            eviction: EvictionPolicy::Fifo,
            font_directories: Vec::new(),
            fallback_font_family: DEFAULT_FALLBACK_FONT.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_scale(mut self, scale: f32) -> Self {
        self.export_scale = scale;
        self
    }

    pub fn with_qr_size(mut self, size: u32) -> Self {
        self.qr_size = size;
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub fn with_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }

    pub fn with_image_cache_capacity(mut self, capacity: usize) -> Self {
        self.image_cache_capacity = capacity;
        self
    }

    pub fn with_font_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_directories.push(dir.into());
        self
    }

    pub fn with_fallback_font_family(mut self, family: impl Into<String>) -> Self {
        self.fallback_font_family = family.into();
        self
    }

    /// Applies `API_URL` and `SIGNATURE_FONT_DIRS` from the process
    /// environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`. Empty values are ignored;
    /// font directories are appended after the configured ones.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_PUBLIC_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.public_base_url = Some(url.trim().to_string());
        }
        if let Some(dirs) = lookup(ENV_FONT_DIRS).filter(|d| !d.trim().is_empty()) {
            self.font_directories
                .extend(std::env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()));
        }
        self
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
