// Swarm resolver: maps a playlist to the stable grouping identifier under
// which the loading engine scopes caching and content sharing.

use crate::error::SchedulerError;
use crate::playlist::Playlist;
use crate::registry::PlaylistRegistry;

/// Resolve the swarm identifier for `playlist`.
///
/// Variants of one logical stream share the master's identity while staying
/// distinguishable by child position: a variant listed at position `i` in
/// the master resolves to `master_url + "+" + i`. The master itself, a
/// playlist with no master, or a variant unknown to the current master (for
/// example requested before the master was parsed) all resolve to the
/// playlist's own URL.
pub fn resolve(registry: &PlaylistRegistry, playlist: &Playlist) -> Result<String, SchedulerError> {
    let Some(master) = registry.find_master()? else {
        return Ok(playlist.url().to_string());
    };
    if master.url() == playlist.url() {
        return Ok(master.url().to_string());
    }
    match master
        .child_absolute_urls()
        .iter()
        .position(|child| child == playlist.url())
    {
        Some(index) => Ok(format!("{}+{}", master.url(), index)),
        None => Ok(playlist.url().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, ManifestRef, ManifestSegment};

    fn media(url: &str, uris: &[&str]) -> Playlist {
        let manifest = Manifest {
            segments: uris
                .iter()
                .map(|u| ManifestSegment { uri: u.to_string() })
                .collect(),
            playlists: Vec::new(),
        };
        Playlist::from_manifest(url, &manifest).unwrap()
    }

    fn master(url: &str, children: &[&str]) -> Playlist {
        let manifest = Manifest {
            segments: Vec::new(),
            playlists: children
                .iter()
                .map(|u| ManifestRef { uri: u.to_string() })
                .collect(),
        };
        Playlist::from_manifest(url, &manifest).unwrap()
    }

    #[test]
    fn no_master_means_own_url() {
        let mut registry = PlaylistRegistry::new();
        registry.put(media("https://h/v1.m3u8", &["s0.ts"]));
        let playlist = registry.get("https://h/v1.m3u8").unwrap();
        assert_eq!(resolve(&registry, playlist).unwrap(), "https://h/v1.m3u8");
    }

    #[test]
    fn master_resolves_to_its_own_url() {
        let mut registry = PlaylistRegistry::new();
        registry.put(master("https://h/m.m3u8", &["v1.m3u8", "v2.m3u8"]));
        let playlist = registry.get("https://h/m.m3u8").unwrap();
        assert_eq!(resolve(&registry, playlist).unwrap(), "https://h/m.m3u8");
    }

    #[test]
    fn listed_variant_gets_master_url_plus_index() {
        let mut registry = PlaylistRegistry::new();
        registry.put(master("https://h/m.m3u8", &["v1.m3u8", "v2.m3u8"]));
        registry.put(media("https://h/v1.m3u8", &["s0.ts"]));
        registry.put(media("https://h/v2.m3u8", &["t0.ts"]));

        let v1 = registry.get("https://h/v1.m3u8").unwrap();
        assert_eq!(resolve(&registry, v1).unwrap(), "https://h/m.m3u8+0");
        let v2 = registry.get("https://h/v2.m3u8").unwrap();
        assert_eq!(resolve(&registry, v2).unwrap(), "https://h/m.m3u8+1");
    }

    #[test]
    fn variant_unknown_to_the_master_falls_back_to_own_url() {
        let mut registry = PlaylistRegistry::new();
        registry.put(master("https://h/m.m3u8", &["v1.m3u8"]));
        registry.put(media("https://h/other.m3u8", &["s0.ts"]));

        let other = registry.get("https://h/other.m3u8").unwrap();
        assert_eq!(
            resolve(&registry, other).unwrap(),
            "https://h/other.m3u8"
        );
    }

    #[test]
    fn two_masters_propagate_the_configuration_error() {
        let mut registry = PlaylistRegistry::new();
        registry.put(master("https://h/m1.m3u8", &["v1.m3u8"]));
        registry.put(master("https://h/m2.m3u8", &["v2.m3u8"]));
        registry.put(media("https://h/v1.m3u8", &["s0.ts"]));

        let v1 = registry.get("https://h/v1.m3u8").unwrap();
        assert!(matches!(
            resolve(&registry, v1),
            Err(SchedulerError::Configuration { .. })
        ));
    }
}
