use super::config::SessionConfig;
use super::reader::TranscriptReader;
use super::stats::{SessionCounters, SessionStats};
use crate::audio::convert::AudioChunkConverter;
use crate::audio::pcm::{pcm16_to_f32_bytes, SEGMENT_BOUNDARY};
use crate::process::ProcessStreams;
use crate::protocol::{AudioChunk, AudioStart, AudioStop, Describe, Event, EventMessage};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A client connection bound to the running whisper process
///
/// Events are handled one at a time, in arrival order. Audio and segment
/// markers are written inline under the process input lock; whisper output
/// is read by a single background task started on first audio activity.
/// From that point until drop the session holds the process binding, so
/// other sessions wait before writing audio or reading output.
pub struct TranscriptionSession {
    /// Session identifier (used in logs and stats)
    id: String,

    /// Session configuration
    config: SessionConfig,

    /// Converts inbound chunks to the format whisper expects
    converter: AudioChunkConverter,

    /// Whisper process input and output
    streams: ProcessStreams,

    /// Pre-built response to `describe`
    info_event: Event,

    /// Outbound events to the client
    events: mpsc::Sender<Event>,

    /// Handle for the transcript reading task, set at most once
    reader_task: Mutex<Option<JoinHandle<()>>>,

    /// Exclusive use of the whisper process, taken on first audio activity
    binding: Mutex<Option<OwnedSemaphorePermit>>,

    counters: Arc<SessionCounters>,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,
}

impl TranscriptionSession {
    pub fn new(
        id: impl Into<String>,
        config: SessionConfig,
        streams: ProcessStreams,
        info_event: Event,
        events: mpsc::Sender<Event>,
    ) -> Self {
        let id = id.into();
        info!("Creating transcription session: {}", id);

        let converter =
            AudioChunkConverter::new(config.sample_rate, config.sample_width, config.channels);

        Self {
            id,
            config,
            converter,
            streams,
            info_event,
            events,
            reader_task: Mutex::new(None),
            binding: Mutex::new(None),
            counters: Arc::new(SessionCounters::default()),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle one client event
    ///
    /// Returns whether the connection should stay open. Errors writing to
    /// the whisper process are returned to the caller without retry.
    pub async fn handle_event(&self, event: &Event) -> Result<bool> {
        if Describe::is_type(&event.event_type) {
            self.events
                .send(self.info_event.clone())
                .await
                .context("Failed to send info")?;
            debug!("Sent info");
            return Ok(true);
        }

        if AudioChunk::is_type(&event.event_type) {
            let chunk = AudioChunk::from_event(event)?;
            self.forward_audio(chunk).await?;
        } else if AudioStop::is_type(&event.event_type) {
            debug!("Audio stopped");
            self.end_segment().await?;
        } else if AudioStart::is_type(&event.event_type) {
            debug!("Audio started");
            self.bind_process().await?;
        } else {
            debug!("Unhandled event: {}", event.event_type);
            return Ok(true);
        }

        self.ensure_reader_started().await?;

        Ok(true)
    }

    /// Bind the whisper process to this session, waiting for any other
    /// bound session to end first
    async fn bind_process(&self) -> Result<()> {
        let mut binding = self.binding.lock().await;
        if binding.is_none() {
            debug!("Session {} waiting for whisper process", self.id);
            *binding = Some(self.streams.bind_session().await?);
            debug!("Session {} bound to whisper process", self.id);
        }
        Ok(())
    }

    /// Convert a chunk to float samples and write it to the whisper process
    pub async fn forward_audio(&self, chunk: AudioChunk) -> Result<()> {
        self.bind_process().await?;

        let chunk = self
            .converter
            .convert(chunk)
            .context("Failed to convert audio chunk")?;
        let samples = pcm16_to_f32_bytes(&chunk.audio);

        {
            let mut input = self.streams.input().lock().await;
            input
                .write_all(&samples)
                .await
                .context("Failed to write audio to whisper process")?;
            input
                .flush()
                .await
                .context("Failed to flush audio to whisper process")?;
        }

        self.counters.chunks_forwarded.fetch_add(1, Ordering::SeqCst);
        self.counters
            .bytes_forwarded
            .fetch_add(samples.len(), Ordering::SeqCst);

        Ok(())
    }

    /// Flush pending audio, then write the segment boundary marker
    pub async fn end_segment(&self) -> Result<()> {
        self.bind_process().await?;

        {
            let mut input = self.streams.input().lock().await;
            input
                .flush()
                .await
                .context("Failed to flush audio to whisper process")?;
            input
                .write_all(&SEGMENT_BOUNDARY)
                .await
                .context("Failed to write segment marker to whisper process")?;
            input
                .flush()
                .await
                .context("Failed to flush segment marker to whisper process")?;
        }

        self.counters.segments_ended.fetch_add(1, Ordering::SeqCst);
        debug!("Wrote NaN marker to whisper process stdin");

        Ok(())
    }

    /// Start the transcript reader unless one was already started
    ///
    /// Binds the process first. Returns true if this call started the reader.
    pub async fn ensure_reader_started(&self) -> Result<bool> {
        self.bind_process().await?;

        let mut slot = self.reader_task.lock().await;
        if slot.is_some() {
            return Ok(false);
        }

        let reader = TranscriptReader::with_counters(
            Arc::clone(self.streams.output()),
            self.events.clone(),
            self.config.language.clone(),
            Arc::clone(&self.counters),
        );

        *slot = Some(tokio::spawn(async move {
            reader.run().await;
        }));

        debug!("Started transcript reader for session {}", self.id);

        Ok(true)
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let reader_started = self.reader_task.lock().await.is_some();

        SessionStats {
            session_id: self.id.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_forwarded: self.counters.chunks_forwarded.load(Ordering::SeqCst),
            bytes_forwarded: self.counters.bytes_forwarded.load(Ordering::SeqCst),
            segments_ended: self.counters.segments_ended.load(Ordering::SeqCst),
            transcripts_emitted: self.counters.transcripts_emitted.load(Ordering::SeqCst),
            reader_started,
        }
    }
}

impl Drop for TranscriptionSession {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.get_mut().take() {
            debug!("Aborting transcript reader for session {}", self.id);
            task.abort();
        }

        if self.binding.get_mut().take().is_some() {
            debug!("Session {} released whisper process", self.id);
        }
    }
}
