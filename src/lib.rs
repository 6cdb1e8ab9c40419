pub mod audio;
pub mod cli;
pub mod config;
pub mod process;
pub mod protocol;
pub mod server;
pub mod session;

pub use audio::{pcm16_to_f32_bytes, AudioChunkConverter, SEGMENT_BOUNDARY};
pub use cli::Cli;
pub use config::Config;
pub use process::{OutputLines, ProcessStreams, WhisperProcess};
pub use protocol::{Event, EventMessage, Info};
pub use server::{serve_connection, Server};
pub use session::{SessionConfig, SessionStats, TranscriptReader, TranscriptionSession};
