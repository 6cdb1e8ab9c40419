use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version written into every outgoing header
pub const PROTOCOL_VERSION: &str = "1.5.2";

/// Longest header line accepted from a client
pub const MAX_HEADER_LENGTH: u64 = 64 * 1024;

/// Largest data block accepted from a client
pub const MAX_DATA_LENGTH: usize = 1024 * 1024;

/// Largest binary payload accepted from a client (about 8 minutes of 16kHz mono 16-bit audio)
pub const MAX_PAYLOAD_LENGTH: usize = 16 * 1024 * 1024;

/// A single protocol event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event type (e.g. "audio-chunk", "transcript")
    pub event_type: String,

    /// Structured event data
    pub data: Map<String, Value>,

    /// Optional binary payload (audio samples for "audio-chunk")
    pub payload: Option<Vec<u8>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: Map::new(),
            payload: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Header line preceding every event on the wire
#[derive(Debug, Serialize, Deserialize)]
struct EventHeader {
    #[serde(rename = "type")]
    event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    /// Inline data, merged with (and overridden by) the data block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_length: Option<usize>,
}

/// Read the next event from a client stream
///
/// Returns `Ok(None)` when the stream ends cleanly before a header.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<Event>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let read = (&mut *reader)
            .take(MAX_HEADER_LENGTH)
            .read_line(&mut line)
            .await
            .context("Failed to read event header")?;

        if read == 0 {
            return Ok(None);
        }

        if read as u64 >= MAX_HEADER_LENGTH && !line.ends_with('\n') {
            bail!("Event header exceeds {} bytes", MAX_HEADER_LENGTH);
        }

        if !line.trim().is_empty() {
            break;
        }
    }

    let header: EventHeader = serde_json::from_str(line.trim())
        .with_context(|| format!("Invalid event header: {}", line.trim()))?;

    let mut data = header.data.unwrap_or_default();

    if let Some(length) = header.data_length.filter(|&length| length > 0) {
        if length > MAX_DATA_LENGTH {
            bail!(
                "Event data length {} exceeds limit of {} bytes",
                length,
                MAX_DATA_LENGTH
            );
        }

        let mut buf = vec![0u8; length];
        reader
            .read_exact(&mut buf)
            .await
            .context("Failed to read event data")?;

        let extra: Map<String, Value> =
            serde_json::from_slice(&buf).context("Event data is not a JSON object")?;
        data.extend(extra);
    }

    let payload = match header.payload_length {
        Some(length) if length > MAX_PAYLOAD_LENGTH => {
            bail!(
                "Event payload length {} exceeds limit of {} bytes",
                length,
                MAX_PAYLOAD_LENGTH
            );
        }
        Some(length) if length > 0 => {
            let mut buf = vec![0u8; length];
            reader
                .read_exact(&mut buf)
                .await
                .context("Failed to read event payload")?;
            Some(buf)
        }
        _ => None,
    };

    Ok(Some(Event {
        event_type: header.event_type,
        data,
        payload,
    }))
}

/// Write an event to a client stream and flush it
pub async fn write_event<W>(writer: &mut W, event: &Event) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let data = if event.data.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&event.data).context("Failed to encode event data")?)
    };

    let header = EventHeader {
        event_type: event.event_type.clone(),
        version: Some(PROTOCOL_VERSION.to_string()),
        data: None,
        data_length: data.as_ref().map(Vec::len),
        payload_length: event.payload.as_ref().map(Vec::len),
    };

    let mut line = serde_json::to_vec(&header).context("Failed to encode event header")?;
    line.push(b'\n');

    writer
        .write_all(&line)
        .await
        .context("Failed to write event header")?;

    if let Some(data) = &data {
        writer
            .write_all(data)
            .await
            .context("Failed to write event data")?;
    }

    if let Some(payload) = &event.payload {
        writer
            .write_all(payload)
            .await
            .context("Failed to write event payload")?;
    }

    writer.flush().await.context("Failed to flush event")?;

    Ok(())
}
