// Manifest boundary: the validated shape handed to the playlist index, plus
// the parser collaborator trait and its default m3u8-rs implementation.

use crate::error::SchedulerError;

/// One fetchable media segment entry as listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSegment {
    /// Segment URI, absolute or relative to the playlist location.
    pub uri: String,
}

/// Reference to a child (variant) playlist in a master manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRef {
    pub uri: String,
}

/// Parsed manifest structure, validated at the parser boundary.
///
/// A non-empty `playlists` marks a master manifest; media manifests carry
/// only `segments`.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub segments: Vec<ManifestSegment>,
    pub playlists: Vec<ManifestRef>,
}

impl Manifest {
    pub fn is_master(&self) -> bool {
        !self.playlists.is_empty()
    }
}

/// Collaborator that turns raw manifest text into a [`Manifest`].
pub trait ManifestParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Manifest, SchedulerError>;
}

/// Default parser backed by `m3u8-rs`.
#[derive(Debug, Default)]
pub struct M3u8Parser;

impl ManifestParser for M3u8Parser {
    fn parse(&self, text: &str) -> Result<Manifest, SchedulerError> {
        match m3u8_rs::parse_playlist_res(text.as_bytes()) {
            Ok(m3u8_rs::Playlist::MasterPlaylist(pl)) => Ok(Manifest {
                segments: Vec::new(),
                playlists: pl
                    .variants
                    .into_iter()
                    .map(|v| ManifestRef { uri: v.uri })
                    .collect(),
            }),
            Ok(m3u8_rs::Playlist::MediaPlaylist(pl)) => Ok(Manifest {
                segments: pl
                    .segments
                    .into_iter()
                    .map(|s| ManifestSegment { uri: s.uri })
                    .collect(),
                playlists: Vec::new(),
            }),
            Err(e) => Err(SchedulerError::playlist(format!(
                "failed to parse manifest: {e}"
            ))),
        }
    }
}
