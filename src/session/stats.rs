use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicUsize;

/// Statistics about a transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio chunks written to the whisper process
    pub chunks_forwarded: usize,

    /// Float sample bytes written to the whisper process
    pub bytes_forwarded: usize,

    /// Segment boundary markers written
    pub segments_ended: usize,

    /// Transcript events published
    pub transcripts_emitted: usize,

    /// Whether the transcript reader has been started
    pub reader_started: bool,
}

/// Live counters shared between the session and its reader task
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub chunks_forwarded: AtomicUsize,
    pub bytes_forwarded: AtomicUsize,
    pub segments_ended: AtomicUsize,
    pub transcripts_emitted: AtomicUsize,
}
