use crate::session::SessionConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Environment variable prefix, e.g. `WHISPER_BRIDGE__SERVER__URI`
const ENV_PREFIX: &str = "WHISPER_BRIDGE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub whisper: WhisperConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "tcp://0.0.0.0:10300"
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperConfig {
    /// Path to the streaming whisper binary
    pub binary: String,
    /// Path to the ggml model file
    pub model: String,
    /// Spoken language hint; auto-detect when unset
    #[serde(default)]
    pub language: Option<String>,
    pub threads: u32,
    /// Extra arguments appended to the whisper command line
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Format the whisper process expects on stdin (before float conversion)
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub sample_width: u16,
    pub channels: u16,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("server.uri", "tcp://0.0.0.0:10300")?
            .set_default("whisper.binary", "whisper-stream")?
            .set_default("whisper.model", "models/ggml-large-v3-turbo-q5_0.bin")?
            .set_default("whisper.threads", 4_i64)?
            .set_default("audio.sample_rate", 16000_i64)?
            .set_default("audio.sample_width", 2_i64)?
            .set_default("audio.channels", 1_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.whisper.binary.trim().is_empty() {
            bail!("whisper.binary must not be empty");
        }

        if self.whisper.threads == 0 {
            bail!("whisper.threads must be at least 1");
        }

        if self.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be greater than 0");
        }

        // Samples are reinterpreted as signed 16-bit before float conversion
        if self.audio.sample_width != 2 {
            bail!(
                "audio.sample_width must be 2 bytes, got {}",
                self.audio.sample_width
            );
        }

        if self.audio.channels == 0 {
            bail!("audio.channels must be at least 1");
        }

        Ok(())
    }

    /// Per-connection session settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sample_rate: self.audio.sample_rate,
            sample_width: self.audio.sample_width,
            channels: self.audio.channels,
            language: self.whisper.language.clone(),
        }
    }
}
