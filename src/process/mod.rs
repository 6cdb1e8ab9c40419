//! The whisper inference subprocess
//!
//! The bridge only talks to the process through its two streams: float
//! samples go in on stdin, transcript lines come out on stdout.

use crate::config::WhisperConfig;
use anyhow::{Context, Result};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::info;

pub type ProcessInput = Box<dyn AsyncWrite + Send + Unpin>;
pub type ProcessOutput = Box<dyn AsyncBufRead + Send + Unpin>;

/// Line reader over the subprocess output
///
/// Bytes of a line still being read are kept here rather than in the
/// caller, so a reader cancelled mid-line leaves them for the next one.
pub struct OutputLines {
    reader: ProcessOutput,
    partial: Vec<u8>,
}

impl OutputLines {
    fn new(reader: ProcessOutput) -> Self {
        Self {
            reader,
            partial: Vec::new(),
        }
    }

    /// Read the next line, including its terminator if present
    ///
    /// Returns `Ok(None)` once the output is closed and no bytes are pending.
    /// Cancel safe: dropping the future never loses bytes already read.
    pub async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.partial).await?;

        if read == 0 && self.partial.is_empty() {
            return Ok(None);
        }

        Ok(Some(std::mem::take(&mut self.partial)))
    }
}

/// Shared handles to the subprocess input and output streams
///
/// The input mutex is the write lock: audio and segment markers are written
/// while holding it. The output mutex is held by the active transcript
/// reader for its whole lifetime. The session permit binds the process to
/// one session at a time.
#[derive(Clone)]
pub struct ProcessStreams {
    input: Arc<Mutex<ProcessInput>>,
    output: Arc<Mutex<OutputLines>>,
    session_permit: Arc<Semaphore>,
}

impl ProcessStreams {
    pub fn new<W, R>(input: W, output: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let input: ProcessInput = Box::new(input);
        let output: ProcessOutput = Box::new(BufReader::new(output));

        Self {
            input: Arc::new(Mutex::new(input)),
            output: Arc::new(Mutex::new(OutputLines::new(output))),
            session_permit: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn input(&self) -> &Arc<Mutex<ProcessInput>> {
        &self.input
    }

    pub fn output(&self) -> &Arc<Mutex<OutputLines>> {
        &self.output
    }

    /// Wait until no other session is bound to the process, then bind
    ///
    /// The process stays bound until the returned permit is dropped.
    pub async fn bind_session(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.session_permit)
            .acquire_owned()
            .await
            .context("Whisper process is no longer accepting sessions")
    }
}

/// A running whisper streaming process
pub struct WhisperProcess {
    child: Child,
    streams: ProcessStreams,
}

impl WhisperProcess {
    /// Start the whisper binary reading audio from stdin
    pub fn spawn(config: &WhisperConfig) -> Result<Self> {
        let args = command_args(config);
        info!("Starting whisper process: {} {}", config.binary, args.join(" "));

        let mut child = Command::new(&config.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start whisper process: {}", config.binary))?;

        let stdin = child
            .stdin
            .take()
            .context("Whisper process stdin is not piped")?;
        let stdout = child
            .stdout
            .take()
            .context("Whisper process stdout is not piped")?;

        info!("Whisper process started (pid={:?})", child.id());

        Ok(Self {
            child,
            streams: ProcessStreams::new(stdin, stdout),
        })
    }

    pub fn streams(&self) -> ProcessStreams {
        self.streams.clone()
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .await
            .context("Failed to wait for whisper process")
    }
}

/// Command line for the whisper binary
pub fn command_args(config: &WhisperConfig) -> Vec<String> {
    let mut args = vec![
        "--stdin".to_string(),
        "--model".to_string(),
        config.model.clone(),
        "--language".to_string(),
        config.language.clone().unwrap_or_else(|| "auto".to_string()),
        "--threads".to_string(),
        config.threads.to_string(),
    ];
    args.extend(config.extra_args.iter().cloned());
    args
}
