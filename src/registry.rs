// Playlist registry: owns all known playlist indexes, keyed by absolute URL.

use crate::error::SchedulerError;
use crate::playlist::Playlist;

/// Insertion-ordered collection of known playlists.
///
/// Upserts replace the prior entry wholesale while keeping its slot, so
/// iteration order stays deterministic across reprocessing.
#[derive(Debug, Default)]
pub struct PlaylistRegistry {
    playlists: Vec<Playlist>,
}

impl PlaylistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by URL; the last write wins and fully replaces prior
    /// segments and child references.
    pub fn put(&mut self, playlist: Playlist) {
        if let Some(slot) = self
            .playlists
            .iter_mut()
            .find(|p| p.url() == playlist.url())
        {
            *slot = playlist;
        } else {
            self.playlists.push(playlist);
        }
    }

    pub fn get(&self, url: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.url() == url)
    }

    pub fn remove(&mut self, url: &str) -> Option<Playlist> {
        let pos = self.playlists.iter().position(|p| p.url() == url)?;
        Some(self.playlists.remove(pos))
    }

    pub fn all(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    /// The single master playlist, if one is registered.
    ///
    /// More than one master is a configuration error rather than a silent
    /// first-pick.
    pub fn find_master(&self) -> Result<Option<&Playlist>, SchedulerError> {
        let mut masters = self.playlists.iter().filter(|p| p.is_master());
        let first = masters.next();
        if masters.next().is_some() {
            return Err(SchedulerError::configuration(
                "more than one master playlist registered",
            ));
        }
        Ok(first)
    }
}
