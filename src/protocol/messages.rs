use super::event::Event;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed message carried inside an [`Event`]
pub trait EventMessage: Sized {
    /// Wire name of the event type
    const EVENT_TYPE: &'static str;

    fn is_type(event_type: &str) -> bool {
        event_type == Self::EVENT_TYPE
    }

    fn from_event(event: &Event) -> Result<Self>;

    fn to_event(&self) -> Event;
}

fn decode_data<T: DeserializeOwned>(event: &Event) -> Result<T> {
    serde_json::from_value(Value::Object(event.data.clone()))
        .with_context(|| format!("Invalid data for {} event", event.event_type))
}

fn encode_data<T: Serialize>(data: &T) -> Map<String, Value> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AudioFormatData {
    rate: u32,
    width: u16,
    channels: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
}

/// Capability query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Describe;

impl EventMessage for Describe {
    const EVENT_TYPE: &'static str = "describe";

    fn from_event(_event: &Event) -> Result<Self> {
        Ok(Self)
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE)
    }
}

/// Start of an audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStart {
    pub rate: u32,
    pub width: u16,
    pub channels: u16,
    pub timestamp: Option<u64>,
}

impl EventMessage for AudioStart {
    const EVENT_TYPE: &'static str = "audio-start";

    fn from_event(event: &Event) -> Result<Self> {
        let data: AudioFormatData = decode_data(event)?;
        Ok(Self {
            rate: data.rate,
            width: data.width,
            channels: data.channels,
            timestamp: data.timestamp,
        })
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE).with_data(encode_data(&AudioFormatData {
            rate: self.rate,
            width: self.width,
            channels: self.channels,
            timestamp: self.timestamp,
        }))
    }
}

/// A unit of inbound audio (raw PCM samples, interleaved, little-endian)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Sample rate in Hz
    pub rate: u32,
    /// Bytes per sample
    pub width: u16,
    /// Number of channels
    pub channels: u16,
    /// Raw sample bytes
    pub audio: Vec<u8>,
    /// Milliseconds since the stream started, if the sender tracks it
    pub timestamp: Option<u64>,
}

impl EventMessage for AudioChunk {
    const EVENT_TYPE: &'static str = "audio-chunk";

    fn from_event(event: &Event) -> Result<Self> {
        let data: AudioFormatData = decode_data(event)?;
        Ok(Self {
            rate: data.rate,
            width: data.width,
            channels: data.channels,
            audio: event.payload.clone().unwrap_or_default(),
            timestamp: data.timestamp,
        })
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE)
            .with_data(encode_data(&AudioFormatData {
                rate: self.rate,
                width: self.width,
                channels: self.channels,
                timestamp: self.timestamp,
            }))
            .with_payload(self.audio.clone())
    }
}

/// End of the current audio segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl EventMessage for AudioStop {
    const EVENT_TYPE: &'static str = "audio-stop";

    fn from_event(event: &Event) -> Result<Self> {
        decode_data(event)
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE).with_data(encode_data(self))
    }
}

/// Transcription request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcribe {
    /// Requested model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Requested language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl EventMessage for Transcribe {
    const EVENT_TYPE: &'static str = "transcribe";

    fn from_event(event: &Event) -> Result<Self> {
        decode_data(event)
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE).with_data(encode_data(self))
    }
}

/// Cumulative transcript for the segment in progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full best-guess text so far
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl EventMessage for Transcript {
    const EVENT_TYPE: &'static str = "transcript";

    fn from_event(event: &Event) -> Result<Self> {
        decode_data(event)
    }

    fn to_event(&self) -> Event {
        Event::new(Self::EVENT_TYPE).with_data(encode_data(self))
    }
}
