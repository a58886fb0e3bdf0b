// Chunk locator: maps a chunk URL back to its owning playlist and ordinal
// position by scanning the registry.

use crate::registry::PlaylistRegistry;

/// Location of a chunk within a known playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLocation {
    pub playlist_url: String,
    pub index: usize,
}

/// Find the playlist owning `url` and the chunk's position in it.
///
/// When the same chunk URL appears in more than one playlist (duplicate
/// content across variants), the tie-break is deterministic: the playlist
/// named by `preferred_playlist` (the one owning the most recent active
/// request) is probed first, then the registry in insertion order.
pub fn locate(
    registry: &PlaylistRegistry,
    url: &str,
    preferred_playlist: Option<&str>,
) -> Option<ChunkLocation> {
    if let Some(preferred) = preferred_playlist
        && let Some(playlist) = registry.get(preferred)
        && let Some(index) = playlist.index_of(url)
    {
        return Some(ChunkLocation {
            playlist_url: playlist.url().to_string(),
            index,
        });
    }

    for playlist in registry.all() {
        if preferred_playlist == Some(playlist.url()) {
            continue;
        }
        if let Some(index) = playlist.index_of(url) {
            return Some(ChunkLocation {
                playlist_url: playlist.url().to_string(),
                index,
            });
        }
    }
    None
}
