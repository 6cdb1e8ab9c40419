//! Event protocol spoken with clients
//!
//! Every message is a JSON header line, optionally followed by a JSON data
//! block and a binary payload. The typed messages in [`messages`] convert
//! to and from the generic [`Event`] envelope.

mod event;
mod info;
mod messages;

pub use event::{
    read_event, write_event, Event, MAX_DATA_LENGTH, MAX_HEADER_LENGTH, MAX_PAYLOAD_LENGTH,
    PROTOCOL_VERSION,
};
pub use info::{AsrModel, AsrProgram, Attribution, Info};
pub use messages::{
    AudioChunk, AudioStart, AudioStop, Describe, EventMessage, Transcribe, Transcript,
};
