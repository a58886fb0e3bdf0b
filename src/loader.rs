// Loading engine boundary: the batch submission trait plus the terminal
// events the engine emits back, out of order relative to submission.

use crate::error::SchedulerError;
use async_trait::async_trait;
use bytes::Bytes;

/// One prioritized fetch descriptor submitted to the loading engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub url: String,
    /// Lower value = more urgent.
    pub priority: u32,
}

/// Terminal events emitted by the loading engine, one per chunk URL.
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    Loaded { url: String, payload: Bytes },
    Error { url: String, detail: String },
    Aborted { url: String },
}

impl LoaderEvent {
    pub fn url(&self) -> &str {
        match self {
            Self::Loaded { url, .. } | Self::Error { url, .. } | Self::Aborted { url } => url,
        }
    }
}

/// Content-loading engine collaborator.
///
/// The engine runs its own concurrent fetch/exchange logic; this layer only
/// submits prioritized batches under a swarm id and consumes the engine's
/// event stream. Cancellation of already-submitted fetches, caching of
/// prefetched chunks, and peer exchange are the engine's concern.
#[async_trait]
pub trait LoaderBackend: Send + Sync {
    async fn load(
        &self,
        descriptors: Vec<FileDescriptor>,
        swarm_id: &str,
        primary_url: Option<&str>,
    ) -> Result<(), SchedulerError>;
}
