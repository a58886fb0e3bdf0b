use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler shut down")]
    Cancelled,

    #[error("malformed playlist URL `{url}`: no path separator")]
    MalformedUrl { url: String },

    #[error("chunk `{url}` does not belong to any known playlist")]
    ChunkNotFound { url: String },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("playlist error: {reason}")]
    Playlist { reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("chunk fetch failed for `{url}`: {detail}")]
    ChunkFetch { url: String, detail: String },

    #[error("Loading aborted")]
    Aborted,

    #[error("request superseded before completion")]
    Superseded,

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl SchedulerError {
    pub fn malformed_url(url: impl Into<String>) -> Self {
        Self::MalformedUrl { url: url.into() }
    }

    pub fn chunk_not_found(url: impl Into<String>) -> Self {
        Self::ChunkNotFound { url: url.into() }
    }

    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn playlist(reason: impl Into<String>) -> Self {
        Self::Playlist {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Whether this error is terminal for the whole scheduling session rather
    /// than for a single chunk request.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Configuration { .. })
    }
}
