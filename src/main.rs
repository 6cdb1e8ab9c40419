use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use whisper_stream_bridge::{Cli, Config, Info, Server, WhisperProcess};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cfg = Config::load(&cli.config)?;
    cli.apply(&mut cfg);
    cfg.validate()?;

    info!("Whisper stream bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", cfg.whisper.model);
    info!(
        "Audio: {} Hz, {} channel(s)",
        cfg.audio.sample_rate, cfg.audio.channels
    );

    let mut process = WhisperProcess::spawn(&cfg.whisper)?;
    let info = Info::from_config(&cfg.whisper);
    let server = Server::bind(
        &cfg.server.uri,
        process.streams(),
        &info,
        cfg.session_config(),
    )
    .await?;

    info!("Ready");

    tokio::select! {
        result = server.run() => result,
        status = process.wait() => bail!("Whisper process exited: {}", status?),
    }
}
