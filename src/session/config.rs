use serde::{Deserialize, Serialize};

/// Configuration for a transcription session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sample rate the whisper process expects (Whisper expects 16kHz)
    pub sample_rate: u32,

    /// Bytes per sample before float conversion (always 16-bit)
    pub sample_width: u16,

    /// Number of audio channels (1 = mono)
    pub channels: u16,

    /// Language hint attached to transcript events
    pub language: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // Whisper expects 16kHz
            sample_width: 2,    // 16-bit PCM
            channels: 1,        // Mono
            language: None,
        }
    }
}
