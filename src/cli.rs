use crate::config::Config;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "whisper-stream-bridge")]
#[command(about = "Streams client audio to a whisper process and publishes live transcripts", long_about = None)]
pub struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, env = "WHISPER_BRIDGE_CONFIG", default_value = "config/whisper-stream-bridge")]
    pub config: String,

    /// Listen address, e.g. tcp://0.0.0.0:10300
    #[arg(long)]
    pub uri: Option<String>,

    /// Path to the streaming whisper binary
    #[arg(long)]
    pub whisper_binary: Option<String>,

    /// Path to the whisper model
    #[arg(long)]
    pub model: Option<String>,

    /// Spoken language hint
    #[arg(long)]
    pub language: Option<String>,

    /// Number of whisper threads
    #[arg(long)]
    pub threads: Option<u32>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Override loaded configuration with flags given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(uri) = &self.uri {
            config.server.uri = uri.clone();
        }
        if let Some(binary) = &self.whisper_binary {
            config.whisper.binary = binary.clone();
        }
        if let Some(model) = &self.model {
            config.whisper.model = model.clone();
        }
        if let Some(language) = &self.language {
            config.whisper.language = Some(language.clone());
        }
        if let Some(threads) = self.threads {
            config.whisper.threads = threads;
        }
    }
}
