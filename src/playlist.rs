// Playlist index: ordered view over one manifest with relative-reference
// resolution against the playlist's base location.

use crate::error::SchedulerError;
use crate::manifest::Manifest;

/// Indexed form of a single parsed manifest.
///
/// Segment order is significant and immutable once built; reprocessing the
/// same URL produces a fresh `Playlist` that replaces this one wholesale in
/// the registry.
#[derive(Debug, Clone)]
pub struct Playlist {
    url: String,
    base_url: String,
    segments: Vec<String>,
    child_refs: Vec<String>,
}

impl Playlist {
    /// Index a parsed manifest located at `url`.
    ///
    /// `url` must contain at least one path separator so a base location can
    /// be derived from it.
    pub fn from_manifest(url: &str, manifest: &Manifest) -> Result<Self, SchedulerError> {
        let sep = url
            .rfind('/')
            .ok_or_else(|| SchedulerError::malformed_url(url))?;
        Ok(Self {
            url: url.to_string(),
            base_url: url[..=sep].to_string(),
            segments: manifest.segments.iter().map(|s| s.uri.clone()).collect(),
            child_refs: manifest.playlists.iter().map(|p| p.uri.clone()).collect(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A master playlist carries child playlist references instead of segments.
    pub fn is_master(&self) -> bool {
        !self.child_refs.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    // URIs carrying a scheme pass through untouched; everything else is
    // resolved against the base location. Applied identically to segments
    // and child playlist references.
    fn resolve(&self, uri: &str) -> String {
        if uri.contains("://") {
            uri.to_string()
        } else {
            format!("{}{}", self.base_url, uri)
        }
    }

    /// Absolute URL of the segment at `index`, if in range.
    pub fn absolute_url_at(&self, index: usize) -> Option<String> {
        self.segments.get(index).map(|uri| self.resolve(uri))
    }

    /// Absolute URLs of all segments from `index` through the end, in order.
    pub fn absolute_urls_from(&self, index: usize) -> impl Iterator<Item = String> + '_ {
        self.segments.iter().skip(index).map(|uri| self.resolve(uri))
    }

    /// Ordinal position of the segment whose absolute URL equals `url`.
    ///
    /// Linear scan; playlist sizes are tens to low hundreds of segments.
    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.segments.iter().position(|uri| self.resolve(uri) == url)
    }

    /// Absolute URLs of child playlist references; empty for a media playlist.
    pub fn child_absolute_urls(&self) -> Vec<String> {
        self.child_refs.iter().map(|uri| self.resolve(uri)).collect()
    }
}
