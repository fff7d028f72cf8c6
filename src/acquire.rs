//! Image acquisition: inline payloads and network URLs to decoded rasters.
//!
//! [`ImageAcquirer::resolve`] never fails. Every problem (bad payload,
//! unreachable host, non-2xx status, undecodable bytes) is logged and turned
//! into `None`, which callers treat as "omit this visual". Successful decodes
//! are kept in a bounded cache keyed by the original source string.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::RenderConfig;
use crate::error::Result;

/// Marker that selects the inline fast path.
pub const INLINE_PREFIX: &str = "data:image";

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Development hosts rewritten to the public base URL before fetching.
pub const DEFAULT_LOCAL_HOSTS: [&str; 4] = [
    "http://localhost:3000",
    "https://localhost:3000",
    "http://localhost",
    "https://localhost",
];

const USER_AGENT: &str = concat!("signature-renderer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
enum AcquireError {
    #[error("inline image has no payload")]
    MissingPayload,

    #[error("inline image payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has zero width or height")]
    Empty,
}

// ============================================================================
// AcquiredImage
// ============================================================================

/// A decoded image together with its PNG encoding for embedding.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    image: DynamicImage,
    png: Arc<[u8]>,
}

impl AcquiredImage {
    /// Decodes `bytes` in any format `image` understands.
    fn decode(bytes: &[u8]) -> Result<Self, AcquireError> {
        let image = image::load_from_memory(bytes)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(AcquireError::Empty);
        }
        Ok(Self::from_image(image)?)
    }

    /// Wraps an already decoded image.
    pub fn from_image(image: DynamicImage) -> Result<Self, image::ImageError> {
        let rgba = image.to_rgba8();
        let mut png = Vec::new();
        PngEncoder::new(Cursor::new(&mut png)).write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )?;

        Ok(Self {
            image,
            png: Arc::from(png),
        })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// PNG bytes of the decoded pixels.
    pub fn png(&self) -> Arc<[u8]> {
        Arc::clone(&self.png)
    }
}

// ============================================================================
// ImageCache
// ============================================================================

/// Which entry leaves the cache when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Oldest insertion first; lookups do not refresh entries.
    #[default]
    Fifo,
    /// Least recently looked up first.
    Lru,
}

/// Bounded map from source string to decoded image.
#[derive(Debug)]
pub struct ImageCache {
    capacity: usize,
    policy: EvictionPolicy,
    entries: HashMap<String, Arc<AcquiredImage>>,
    order: VecDeque<String>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, EvictionPolicy::Fifo)
    }
}

impl ImageCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            capacity,
            policy,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Looks up without touching the eviction order.
    pub fn peek(&self, key: &str) -> Option<Arc<AcquiredImage>> {
        self.entries.get(key).cloned()
    }

    /// Looks up and, under LRU, marks the entry as most recent.
    pub fn get(&mut self, key: &str) -> Option<Arc<AcquiredImage>> {
        let hit = self.entries.get(key).cloned()?;
        if self.policy == EvictionPolicy::Lru {
            self.touch(key);
        }
        Some(hit)
    }

    pub fn insert(&mut self, key: impl Into<String>, image: Arc<AcquiredImage>) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), image);
            if self.policy == EvictionPolicy::Lru {
                self.touch(&key);
            }
            return;
        }

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            log::debug!("evicting cached image {}", truncate(&oldest));
            self.entries.remove(&oldest);
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, image);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

// ============================================================================
// ImageAcquirer
// ============================================================================

/// Resolves image sources; one instance is shared by every render.
#[derive(Debug)]
pub struct ImageAcquirer {
    client: reqwest::Client,
    public_base_url: Option<String>,
    /// Sorted longest first so `http://localhost:3000` wins over
    /// `http://localhost`.
    local_hosts: Vec<String>,
    cache: RwLock<ImageCache>,
}

impl ImageAcquirer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(
            client,
            config.public_base_url.clone(),
            config.local_hosts.clone(),
            ImageCache::new(config.image_cache_capacity, config.eviction),
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        public_base_url: Option<String>,
        mut local_hosts: Vec<String>,
        cache: ImageCache,
    ) -> Self {
        local_hosts.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            client,
            public_base_url: public_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            local_hosts,
            cache: RwLock::new(cache),
        }
    }

    /// Replaces the first matching development host with the public base
    /// URL. URLs are left untouched when no base URL is configured.
    pub fn rewrite_url(&self, url: &str) -> String {
        let Some(base) = &self.public_base_url else {
            return url.to_string();
        };
        self.local_hosts
            .iter()
            .find(|host| url.contains(host.as_str()))
            .map(|host| url.replacen(host.as_str(), base, 1))
            .unwrap_or_else(|| url.to_string())
    }

    /// Resolves `source` to a decoded image, or `None` when it cannot be
    /// acquired.
    pub async fn resolve(&self, source: &str) -> Option<Arc<AcquiredImage>> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }

        if let Some(hit) = self.cached(source).await {
            log::debug!("image cache hit for {}", truncate(source));
            return Some(hit);
        }

        match self.acquire(source).await {
            Ok(image) => {
                let image = Arc::new(image);
                self.cache.write().await.insert(source, Arc::clone(&image));
                Some(image)
            }
            Err(e) => {
                log::warn!("skipping image {}: {}", truncate(source), e);
                None
            }
        }
    }

    /// Resolves every source concurrently, preserving order.
    pub async fn resolve_all(&self, sources: &[&str]) -> Vec<Option<Arc<AcquiredImage>>> {
        join_all(sources.iter().map(|s| self.resolve(s))).await
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    async fn cached(&self, source: &str) -> Option<Arc<AcquiredImage>> {
        let policy = self.cache.read().await.policy();
        match policy {
            EvictionPolicy::Fifo => self.cache.read().await.peek(source),
            EvictionPolicy::Lru => self.cache.write().await.get(source),
        }
    }

    async fn acquire(&self, source: &str) -> Result<AcquiredImage, AcquireError> {
        if source.starts_with(INLINE_PREFIX) {
            return decode_inline(source);
        }

        let url = self.rewrite_url(source);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AcquireError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        AcquiredImage::decode(&bytes)
    }
}

fn decode_inline(source: &str) -> Result<AcquiredImage, AcquireError> {
    let (_, payload) = source.split_once(',').ok_or(AcquireError::MissingPayload)?;
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if payload.is_empty() {
        return Err(AcquireError::MissingPayload);
    }
    let bytes = STANDARD.decode(payload)?;
    AcquiredImage::decode(&bytes)
}

/// Inline payloads can be megabytes long; keep log lines readable.
fn truncate(source: &str) -> &str {
    match source.char_indices().nth(80) {
        Some((i, _)) => &source[..i],
        None => source,
    }
}

// ============================================================================
// Tests
// ============================================================================
