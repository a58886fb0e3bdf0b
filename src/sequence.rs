// Play-sequence tracker: confirmed play order plus the continuity rule that
// decides whether a new request extends the current run or starts a new one.

use crate::locator::ChunkLocation;
use tracing::debug;

/// Tracks chunks confirmed as consumed and the most recently requested
/// chunk, and derives the load-priority base from queue depth.
#[derive(Debug, Default)]
pub struct PlaySequenceTracker {
    /// Consumed chunk URLs, most-recent-last. Either empty or contiguous
    /// within one playlist; a detected break clears it.
    queue: Vec<String>,
    last_requested: Option<String>,
}

impl PlaySequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL of the most recently requested (not necessarily completed) chunk.
    pub fn last_requested(&self) -> Option<&str> {
        self.last_requested.as_deref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Apply the continuity rule for a new request at `location`.
    ///
    /// The sequence continues only when the previous request resolves to the
    /// same playlist at exactly the preceding index; any other shape (seek,
    /// quality switch, playlist swap, unknown previous) clears the queue and
    /// resets load priorities.
    pub fn note_request(&mut self, location: &ChunkLocation, previous: Option<&ChunkLocation>) {
        if self.queue.is_empty() {
            return;
        }
        let continues = previous.is_some_and(|prev| {
            prev.playlist_url == location.playlist_url && prev.index + 1 == location.index
        });
        if !continues {
            debug!(
                playlist = %location.playlist_url,
                index = location.index,
                "sequence break detected; clearing play queue"
            );
            self.queue.clear();
        }
    }

    /// Record `url` as the last-requested chunk for future continuity checks.
    pub fn record_requested(&mut self, url: &str) {
        self.last_requested = Some(url.to_string());
    }

    /// Append a chunk confirmed as consumed.
    pub fn push_played(&mut self, url: &str) {
        self.queue.push(url.to_string());
    }

    /// Playback advanced to `url`: drop everything queued before it. An
    /// unknown `url` is a tracking miss and leaves the queue untouched.
    pub fn advance_to(&mut self, url: &str) {
        if let Some(pos) = self.queue.iter().position(|queued| queued == url) {
            self.queue.drain(..pos);
        } else {
            debug!(url = %url, "now-playing chunk not in play queue; leaving queue as-is");
        }
    }

    /// Base priority for newly scheduled batches; numerically larger means
    /// less urgent. Deeper confirmed queues push prefetch priorities lower.
    pub fn priority_base(&self) -> u32 {
        self.queue.len().saturating_sub(1) as u32
    }
}
