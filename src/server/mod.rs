//! TCP server accepting client connections
//!
//! Each connection gets its own `TranscriptionSession` bound to the shared
//! whisper process.

mod connection;

pub use connection::serve_connection;

use crate::process::ProcessStreams;
use crate::protocol::{Event, EventMessage, Info};
use crate::session::SessionConfig;
use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, Instrument};

/// Accepts connections and serves each one on its own task
pub struct Server {
    listener: TcpListener,
    streams: ProcessStreams,
    info_event: Event,
    session_config: SessionConfig,
}

impl Server {
    /// Bind to a `tcp://host:port` URI
    pub async fn bind(
        uri: &str,
        streams: ProcessStreams,
        info: &Info,
        session_config: SessionConfig,
    ) -> Result<Self> {
        let addr = parse_tcp_uri(uri)?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", uri))?;

        info!("Listening on {}", uri);

        Ok(Self {
            listener,
            streams,
            info_event: info.to_event(),
            session_config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Accept connections forever
    pub async fn run(self) -> Result<()> {
        loop {
            let (socket, peer) = self
                .listener
                .accept()
                .await
                .context("Failed to accept connection")?;

            let session_id = uuid::Uuid::new_v4().to_string();
            let span = info_span!("session", id = %session_id, peer = %peer);
            let streams = self.streams.clone();
            let info_event = self.info_event.clone();
            let session_config = self.session_config.clone();

            tokio::spawn(
                async move {
                    info!("Client connected");
                    if let Err(e) =
                        serve_connection(socket, session_id, streams, info_event, session_config)
                            .await
                    {
                        error!("Connection failed: {:#}", e);
                    }
                }
                .instrument(span),
            );
        }
    }
}

/// Extract `host:port` from a `tcp://host:port` URI
pub fn parse_tcp_uri(uri: &str) -> Result<&str> {
    match uri.strip_prefix("tcp://") {
        Some(addr) if !addr.is_empty() => Ok(addr),
        _ => bail!("Unsupported server URI (expected tcp://host:port): {}", uri),
    }
}
