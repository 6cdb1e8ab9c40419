use crate::process::ProcessStreams;
use crate::protocol::{read_event, write_event, Event};
use crate::session::{SessionConfig, SessionStats, TranscriptionSession};
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound events buffered per connection before the session waits
const EVENT_BUFFER: usize = 64;

/// Serve one client connection until it closes or fails
///
/// Inbound events are dispatched to the session strictly in order. A
/// separate task drains the session's outbound events to the client.
pub async fn serve_connection<S>(
    stream: S,
    session_id: String,
    streams: ProcessStreams,
    info_event: Event,
    session_config: SessionConfig,
) -> Result<SessionStats>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let (events_tx, mut events_rx) = mpsc::channel::<Event>(EVENT_BUFFER);

    let writer_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let Err(e) = write_event(&mut write_half, &event).await {
                warn!("Failed to write {} event: {:#}", event.event_type, e);
                break;
            }
        }
    });

    let session = TranscriptionSession::new(
        session_id,
        session_config,
        streams,
        info_event,
        events_tx,
    );

    let result = loop {
        match read_event(&mut reader).await {
            Ok(Some(event)) => match session.handle_event(&event).await {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            },
            Ok(None) => {
                debug!("Client disconnected");
                break Ok(());
            }
            Err(e) => break Err(e),
        }
    };

    let stats = session.stats().await;

    // Dropping the session aborts its reader and releases the event sender
    drop(session);

    if let Err(e) = writer_task.await {
        warn!("Event writer task failed: {}", e);
    }

    info!(
        "Session {} closed: {} chunks ({} bytes), {} segments, {} transcripts",
        stats.session_id,
        stats.chunks_forwarded,
        stats.bytes_forwarded,
        stats.segments_ended,
        stats.transcripts_emitted
    );

    result.map(|_| stats)
}
