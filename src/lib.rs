// swarmio: chunk/playlist scheduling layer for segmented (HLS-style)
// media streams.
//
// Parses and indexes master/variant playlists, locates arbitrary chunk URLs
// within that index, infers playback continuity and load priority from
// observed play order, resolves the swarm identity under which the loading
// engine scopes caching and sharing, and correlates the engine's
// asynchronous completion events back to the single chunk the caller is
// actively waiting on.

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod locator;
pub mod manifest;
pub mod playlist;
pub mod registry;
pub mod scheduler;
pub mod sequence;
pub mod swarm;

pub use config::{FetchConfig, SchedulerConfig};
pub use error::SchedulerError;
pub use fetch::{HttpManifestFetcher, ManifestFetcher};
pub use loader::{FileDescriptor, LoaderBackend, LoaderEvent};
pub use locator::ChunkLocation;
pub use manifest::{M3u8Parser, Manifest, ManifestParser, ManifestRef, ManifestSegment};
pub use playlist::Playlist;
pub use registry::PlaylistRegistry;
pub use scheduler::{ChunkScheduler, PendingChunk};
pub use sequence::PlaySequenceTracker;
