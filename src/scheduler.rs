// Chunk scheduling driver: owns the playlist registry, the play-sequence
// state, and the single active chunk request; turns "the player wants chunk
// X now" into a prioritized forward batch for the loading engine and
// correlates the engine's completion events back to the active request.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::fetch::ManifestFetcher;
use crate::loader::{FileDescriptor, LoaderBackend, LoaderEvent};
use crate::locator::{self, ChunkLocation};
use crate::manifest::ManifestParser;
use crate::playlist::Playlist;
use crate::registry::PlaylistRegistry;
use crate::sequence::PlaySequenceTracker;
use crate::swarm;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

type ChunkResult = Result<Bytes, SchedulerError>;

enum Command {
    PutPlaylist {
        playlist: Playlist,
        ack: oneshot::Sender<()>,
    },
    RemovePlaylist {
        url: String,
    },
    RequestChunk {
        url: String,
        reply: oneshot::Sender<ChunkResult>,
    },
    NowPlaying {
        url: Option<String>,
    },
    Abort {
        url: String,
    },
}

/// Completion of a [`ChunkScheduler::request_chunk`] call.
///
/// Resolves exactly once: with the chunk payload, with the request's error,
/// or with [`SchedulerError::Superseded`] when a newer request or an abort
/// discarded interest in this one.
pub struct PendingChunk {
    rx: oneshot::Receiver<ChunkResult>,
}

impl Future for PendingChunk {
    type Output = ChunkResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SchedulerError::Superseded)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Cloneable handle to a spawned scheduling driver.
#[derive(Clone)]
pub struct ChunkScheduler {
    command_tx: mpsc::Sender<Command>,
    fetcher: Arc<dyn ManifestFetcher>,
    parser: Arc<dyn ManifestParser>,
    token: CancellationToken,
}

impl ChunkScheduler {
    /// Spawn the driver task and return a handle to it.
    ///
    /// `loader_events` is the loading engine's event stream; the driver
    /// shuts down when it closes, when all handles are dropped, or when
    /// [`ChunkScheduler::shutdown`] is called.
    pub fn spawn(
        backend: Arc<dyn LoaderBackend>,
        loader_events: mpsc::Receiver<LoaderEvent>,
        fetcher: Arc<dyn ManifestFetcher>,
        parser: Arc<dyn ManifestParser>,
        config: SchedulerConfig,
    ) -> (Self, JoinHandle<()>) {
        let token = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let mut driver = SchedulerDriver {
            config,
            backend,
            loader_events,
            command_rx,
            token: token.clone(),
            registry: PlaylistRegistry::new(),
            tracker: PlaySequenceTracker::new(),
            active: None,
            pending_locate: None,
            last_location: None,
        };
        let handle = tokio::spawn(async move { driver.run().await });
        (
            Self {
                command_tx,
                fetcher,
                parser,
                token,
            },
            handle,
        )
    }

    /// Parse and index a raw manifest for `url`, replacing any prior entry.
    ///
    /// Returns the resolved child-playlist URLs (empty for a media
    /// playlist). Malformed-URL and parse errors surface directly to the
    /// caller.
    pub async fn process_playlist(
        &self,
        url: &str,
        raw_manifest: &str,
    ) -> Result<Vec<String>, SchedulerError> {
        let manifest = self.parser.parse(raw_manifest)?;
        let playlist = Playlist::from_manifest(url, &manifest)?;
        let children = playlist.child_absolute_urls();
        let (ack, ack_rx) = oneshot::channel();
        self.send(Command::PutPlaylist { playlist, ack }).await?;
        ack_rx
            .await
            .map_err(|_| SchedulerError::internal("driver dropped playlist ack"))?;
        Ok(children)
    }

    /// Fetch, parse, and index the playlist at `url`, optionally recursing
    /// one level into child playlists.
    ///
    /// On any failure the partially registered entry for `url` is discarded
    /// so a retry starts clean, and the error propagates.
    pub async fn load_playlist(
        &self,
        url: &str,
        load_child_playlists: bool,
    ) -> Result<String, SchedulerError> {
        match self.load_playlist_inner(url, load_child_playlists).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(url = %url, error = %e, "playlist load failed; discarding partial entry");
                let _ = self
                    .send(Command::RemovePlaylist {
                        url: url.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn load_playlist_inner(
        &self,
        url: &str,
        load_child_playlists: bool,
    ) -> Result<String, SchedulerError> {
        let text = self.fetcher.fetch(url).await?;
        let children = self.process_playlist(url, &text).await?;
        if load_child_playlists {
            for child in children {
                Box::pin(self.load_playlist(&child, false)).await?;
            }
        }
        Ok(text)
    }

    /// Ask for chunk `url` now.
    ///
    /// Resolves the chunk's location (with a bounded retry while its
    /// playlist may still be in flight), submits the forward batch to the
    /// loading engine, and returns a completion that resolves exactly once.
    /// A newer request supersedes this one without an error event.
    pub async fn request_chunk(&self, url: &str) -> Result<PendingChunk, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RequestChunk {
            url: url.to_string(),
            reply,
        })
        .await?;
        Ok(PendingChunk { rx })
    }

    /// Report the chunk now being played (or `None` to just resume).
    ///
    /// Trims the play queue and re-submits the forward batch from the last
    /// requested chunk's location without creating a new active request; a
    /// no-op when nothing was ever requested.
    pub async fn notify_now_playing(&self, url: Option<&str>) -> Result<(), SchedulerError> {
        self.send(Command::NowPlaying {
            url: url.map(str::to_string),
        })
        .await
    }

    /// Clear the active chunk request if its URL matches. Already-submitted
    /// engine-level fetches are not cancelled.
    pub async fn abort_chunk(&self, url: &str) -> Result<(), SchedulerError> {
        self.send(Command::Abort {
            url: url.to_string(),
        })
        .await
    }

    /// Drop the registry entry for `url`, if any.
    pub async fn remove_playlist(&self, url: &str) -> Result<(), SchedulerError> {
        self.send(Command::RemovePlaylist {
            url: url.to_string(),
        })
        .await
    }

    /// Stop the driver task. Outstanding requests resolve with `Cancelled`.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    async fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SchedulerError::Cancelled)
    }
}

struct ActiveChunk {
    url: String,
    reply: oneshot::Sender<ChunkResult>,
}

struct PendingLocate {
    url: String,
    reply: oneshot::Sender<ChunkResult>,
    retries_remaining: u32,
    deadline: Instant,
}

struct SchedulerDriver {
    config: SchedulerConfig,
    backend: Arc<dyn LoaderBackend>,
    loader_events: mpsc::Receiver<LoaderEvent>,
    command_rx: mpsc::Receiver<Command>,
    token: CancellationToken,
    registry: PlaylistRegistry,
    tracker: PlaySequenceTracker,
    /// At most one chunk request is awaited at a time.
    active: Option<ActiveChunk>,
    /// A request whose playlist is not known yet, parked until the retry
    /// timer fires. At most one, superseded by any newer request.
    pending_locate: Option<PendingLocate>,
    /// Location of the last successfully dispatched request; used as the
    /// locate tie-break and for continuity checks.
    last_location: Option<ChunkLocation>,
}

impl SchedulerDriver {
    async fn run(&mut self) {
        info!("Chunk scheduler driver started.");
        loop {
            let retry_timeout = self
                .pending_locate
                .as_ref()
                .map(|p| p.deadline.saturating_duration_since(Instant::now()));

            tokio::select! {
                biased;

                _ = self.token.cancelled() => {
                    info!("Cancellation token received. Chunk scheduler shutting down.");
                    break;
                }

                _ = tokio::time::sleep(retry_timeout.unwrap_or(Duration::MAX)), if retry_timeout.is_some() => {
                    if let Some(pending) = self.pending_locate.take() {
                        trace!(url = %pending.url, "locate retry timer fired");
                        self.begin_request(pending.url, pending.reply, pending.retries_remaining)
                            .await;
                    }
                }

                maybe_command = self.command_rx.recv() => {
                    match maybe_command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!("All scheduler handles dropped. Driver shutting down.");
                            break;
                        }
                    }
                }

                maybe_event = self.loader_events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_loader_event(event),
                        None => {
                            debug!("Loader event channel closed. Driver shutting down.");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(active) = self.active.take() {
            let _ = active.reply.send(Err(SchedulerError::Cancelled));
        }
        if let Some(pending) = self.pending_locate.take() {
            let _ = pending.reply.send(Err(SchedulerError::Cancelled));
        }
        info!("Chunk scheduler driver stopped.");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::PutPlaylist { playlist, ack } => {
                debug!(
                    url = %playlist.url(),
                    segments = playlist.segment_count(),
                    master = playlist.is_master(),
                    "indexed playlist"
                );
                self.registry.put(playlist);
                let _ = ack.send(());
            }
            Command::RemovePlaylist { url } => {
                if self.registry.remove(&url).is_some() {
                    debug!(url = %url, "removed playlist");
                }
            }
            Command::RequestChunk { url, reply } => {
                // A new request supersedes any parked locate retry.
                self.pending_locate = None;
                let retries = self.config.locate_retries;
                self.begin_request(url, reply, retries).await;
            }
            Command::NowPlaying { url } => {
                self.resume_from_last_known(url.as_deref()).await;
            }
            Command::Abort { url } => {
                if self.active.as_ref().is_some_and(|a| a.url == url) {
                    debug!(url = %url, "aborting active chunk request");
                    self.active = None;
                }
                if self.pending_locate.as_ref().is_some_and(|p| p.url == url) {
                    self.pending_locate = None;
                }
            }
        }
    }

    async fn begin_request(
        &mut self,
        url: String,
        reply: oneshot::Sender<ChunkResult>,
        retries_remaining: u32,
    ) {
        let preferred = self
            .last_location
            .as_ref()
            .map(|l| l.playlist_url.clone());
        match locator::locate(&self.registry, &url, preferred.as_deref()) {
            Some(location) => self.dispatch(url, reply, location).await,
            None if retries_remaining > 0 => {
                debug!(
                    url = %url,
                    retries_remaining,
                    "chunk not in any known playlist yet; scheduling locate retry"
                );
                self.pending_locate = Some(PendingLocate {
                    url,
                    reply,
                    retries_remaining: retries_remaining - 1,
                    deadline: Instant::now() + self.config.locate_retry_delay,
                });
            }
            None => {
                warn!(url = %url, "chunk not found after exhausting locate retries");
                let _ = reply.send(Err(SchedulerError::chunk_not_found(&url)));
            }
        }
    }

    async fn dispatch(
        &mut self,
        url: String,
        reply: oneshot::Sender<ChunkResult>,
        location: ChunkLocation,
    ) {
        // Continuity is judged against where the previous request resolves
        // now, not where it resolved then; the playlist may have been
        // replaced in the meantime.
        let previous = self.tracker.last_requested().map(str::to_string);
        let previous_location = previous
            .as_deref()
            .and_then(|prev| locator::locate(&self.registry, prev, Some(&location.playlist_url)));
        self.tracker.note_request(&location, previous_location.as_ref());

        match self.submit_batch(&location, &url).await {
            Ok(()) => {
                // Replacing a prior active request simply discards it; its
                // completion resolves as superseded.
                self.active = Some(ActiveChunk {
                    url: url.clone(),
                    reply,
                });
                self.tracker.record_requested(&url);
                self.last_location = Some(location);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "batch submission failed");
                let _ = reply.send(Err(e));
            }
        }
    }

    /// Build and submit the forward batch: the chunk at `location` plus all
    /// subsequent chunks in its playlist, priorities ascending from the
    /// play-queue base.
    async fn submit_batch(
        &self,
        location: &ChunkLocation,
        primary_url: &str,
    ) -> Result<(), SchedulerError> {
        let playlist = self
            .registry
            .get(&location.playlist_url)
            .ok_or_else(|| SchedulerError::internal("located playlist missing from registry"))?;
        let swarm_id = swarm::resolve(&self.registry, playlist)?;
        let base = self.tracker.priority_base();

        let descriptors: Vec<FileDescriptor> = playlist
            .absolute_urls_from(location.index)
            .enumerate()
            .map(|(offset, url)| FileDescriptor {
                url,
                priority: base + offset as u32,
            })
            .collect();

        trace!(
            count = descriptors.len(),
            swarm = %swarm_id,
            base,
            primary = %primary_url,
            "submitting batch to loading engine"
        );
        self.backend
            .load(descriptors, &swarm_id, Some(primary_url))
            .await
    }

    async fn resume_from_last_known(&mut self, played_url: Option<&str>) {
        if let Some(url) = played_url {
            self.tracker.advance_to(url);
        }
        let Some(last) = self.tracker.last_requested().map(str::to_string) else {
            return;
        };
        let preferred = self
            .last_location
            .as_ref()
            .map(|l| l.playlist_url.clone());
        let Some(location) = locator::locate(&self.registry, &last, preferred.as_deref()) else {
            debug!(url = %last, "last requested chunk no longer resolves; skipping resume");
            return;
        };
        if let Err(e) = self.submit_batch(&location, &last).await {
            warn!(error = %e, "failed to resubmit prefetch batch");
        }
    }

    fn handle_loader_event(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::Loaded { url, payload } => match self.active.take() {
                Some(active) if active.url == url => {
                    trace!(url = %url, bytes = payload.len(), "active chunk loaded");
                    self.tracker.push_played(&url);
                    let _ = active.reply.send(Ok(payload));
                }
                other => {
                    self.active = other;
                    trace!(url = %url, "ignoring loaded event for non-active chunk");
                }
            },
            LoaderEvent::Error { url, detail } => match self.active.take() {
                Some(active) if active.url == url => {
                    debug!(url = %url, detail = %detail, "active chunk failed");
                    let _ = active.reply.send(Err(SchedulerError::ChunkFetch { url, detail }));
                }
                other => {
                    self.active = other;
                    trace!(url = %url, "ignoring error event for non-active chunk");
                }
            },
            LoaderEvent::Aborted { url } => match self.active.take() {
                Some(active) if active.url == url => {
                    debug!(url = %url, "active chunk aborted by the engine");
                    let _ = active.reply.send(Err(SchedulerError::Aborted));
                }
                other => {
                    self.active = other;
                    trace!(url = %url, "ignoring aborted event for non-active chunk");
                }
            },
        }
    }
}
