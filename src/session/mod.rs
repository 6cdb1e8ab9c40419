//! Streaming transcription session
//!
//! This module provides the `TranscriptionSession` that manages:
//! - Dispatching client events (describe, audio chunks, audio stop)
//! - Converting audio to float samples and writing them to the whisper process
//! - Marking segment boundaries on the whisper process input
//! - Reading whisper output and publishing cumulative transcripts

mod config;
mod reader;
mod session;
mod stats;

pub use config::SessionConfig;
pub use reader::{OutputLine, ReaderState, TranscriptAccumulator, TranscriptReader, END_OF_TEXT};
pub use session::TranscriptionSession;
pub use stats::SessionStats;
