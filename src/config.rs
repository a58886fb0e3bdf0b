use std::time::Duration;

/// Configuration for the chunk scheduling driver.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay before re-probing the registry when a requested chunk's playlist
    /// is not known yet. Covers the race where a child playlist fetch is
    /// still in flight when a chunk from it is first requested.
    pub locate_retry_delay: Duration,
    /// Number of locate retries before a request is failed with `ChunkNotFound`.
    pub locate_retries: u32,
    /// Capacity of the command channel between handles and the driver.
    pub command_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            locate_retry_delay: Duration::from_millis(500),
            locate_retries: 1,
            command_buffer: 32,
        }
    }
}

/// Configuration for the default HTTP manifest fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout for manifest fetches.
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}
