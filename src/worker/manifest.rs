//! Manifest Module
//!
//! The fixed list of assets that must be resident in the cache after install.

use crate::models::{normalize_url, FetchRequest};

/// Assets required for full offline operation, in install order.
pub const BUNDLED_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./app.js",
    "./manifest.json",
];

// == Asset Kind ==
/// Asset class inferred from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Document,
    Stylesheet,
    Script,
    Manifest,
    Image,
    Other,
}

impl AssetKind {
    /// Infers the asset class of a URL path.
    ///
    /// Paths ending in `/` are directory indexes and count as documents.
    pub fn from_path(path: &str) -> Self {
        if path.is_empty() || path.ends_with('/') {
            return AssetKind::Document;
        }
        match extension(path).as_deref() {
            Some("html") | Some("htm") => AssetKind::Document,
            Some("css") => AssetKind::Stylesheet,
            Some("js") | Some("mjs") => AssetKind::Script,
            Some("json") | Some("webmanifest") => AssetKind::Manifest,
            Some("png") | Some("jpg") | Some("jpeg") | Some("gif") | Some("svg")
            | Some("ico") | Some("webp") => AssetKind::Image,
            _ => AssetKind::Other,
        }
    }
}

/// Infers a content type from a URL path.
pub fn content_type_for(path: &str) -> &'static str {
    match AssetKind::from_path(path) {
        AssetKind::Document => "text/html; charset=utf-8",
        AssetKind::Stylesheet => "text/css",
        AssetKind::Script => "application/javascript",
        AssetKind::Manifest => match extension(path).as_deref() {
            Some("webmanifest") => "application/manifest+json",
            _ => "application/json",
        },
        AssetKind::Image => match extension(path).as_deref() {
            Some("svg") => "image/svg+xml",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("ico") => "image/x-icon",
            Some("webp") => "image/webp",
            _ => "image/png",
        },
        AssetKind::Other => "application/octet-stream",
    }
}

fn extension(path: &str) -> Option<String> {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

// == Manifest Entry ==
/// A single required asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Normalized origin-relative path
    pub path: String,
    pub kind: AssetKind,
}

impl ManifestEntry {
    pub fn new(path: &str) -> Self {
        let path = normalize_url(path);
        let kind = AssetKind::from_path(&path);
        Self { path, kind }
    }

    /// The GET request that populates this entry.
    pub fn request(&self) -> FetchRequest {
        FetchRequest::get(&self.path)
    }
}

// == Manifest ==
/// Ordered, deduplicated list of required assets.
#[derive(Debug, Clone)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Builds a manifest from paths, dropping duplicates after normalization.
    pub fn new(paths: &[&str]) -> Self {
        let mut entries: Vec<ManifestEntry> = Vec::with_capacity(paths.len());
        for path in paths {
            let entry = ManifestEntry::new(path);
            if !entries.iter().any(|e| e.path == entry.path) {
                entries.push(entry);
            }
        }
        Self { entries }
    }

    /// The manifest shipped with this build.
    pub fn bundled() -> Self {
        Self::new(BUNDLED_ASSETS)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::bundled()
    }
}
