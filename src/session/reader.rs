use super::stats::SessionCounters;
use crate::process::OutputLines;
use crate::protocol::{Event, EventMessage, Transcript};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Line the whisper process prints when it has no more output
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// One line read from the whisper process output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// The output stream is closed
    Closed,
    /// The end-of-text sentinel
    EndOfText,
    /// Whitespace only, or not valid UTF-8
    Blank,
    /// A trimmed transcript fragment
    Text(String),
}

impl OutputLine {
    /// Classify raw line bytes (including any line terminator)
    pub fn parse(raw: &[u8]) -> Self {
        let Ok(line) = std::str::from_utf8(raw) else {
            return Self::Blank;
        };

        match line.trim() {
            END_OF_TEXT => Self::EndOfText,
            "" => Self::Blank,
            text => Self::Text(text.to_string()),
        }
    }
}

/// Fragments read so far, in read order
#[derive(Debug, Clone, Default)]
pub struct TranscriptAccumulator {
    lines: Vec<String>,
}

impl TranscriptAccumulator {
    /// Append a fragment and return the updated transcript
    pub fn push(&mut self, line: String) -> String {
        self.lines.push(line);
        self.text()
    }

    /// Space-joined, trimmed transcript
    pub fn text(&self) -> String {
        self.lines.join(" ").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Running,
    Terminated,
}

/// Reads whisper output and publishes cumulative transcript events
///
/// Runs until the output closes, the end-of-text sentinel is read, or the
/// event channel is dropped. Holds the output lock for its whole lifetime.
pub struct TranscriptReader {
    output: Arc<Mutex<OutputLines>>,
    events: mpsc::Sender<Event>,
    language: Option<String>,
    counters: Arc<SessionCounters>,
    accumulator: TranscriptAccumulator,
}

impl TranscriptReader {
    pub fn new(
        output: Arc<Mutex<OutputLines>>,
        events: mpsc::Sender<Event>,
        language: Option<String>,
    ) -> Self {
        Self::with_counters(output, events, language, Arc::default())
    }

    pub(crate) fn with_counters(
        output: Arc<Mutex<OutputLines>>,
        events: mpsc::Sender<Event>,
        language: Option<String>,
        counters: Arc<SessionCounters>,
    ) -> Self {
        Self {
            output,
            events,
            language,
            counters,
            accumulator: TranscriptAccumulator::default(),
        }
    }

    /// Read until terminated, returning the final transcript
    pub async fn run(mut self) -> String {
        let output = Arc::clone(&self.output);
        let mut output = output.lock().await;

        debug!("Transcript reader started");

        while self.step(&mut output).await == ReaderState::Running {}

        debug!("Completed streaming transcription");

        self.accumulator.text()
    }

    async fn step(&mut self, output: &mut OutputLines) -> ReaderState {
        let line = match output.next_line().await {
            Ok(None) => OutputLine::Closed,
            Ok(Some(raw)) => OutputLine::parse(&raw),
            Err(e) => {
                warn!("Failed to read whisper output: {}", e);
                return ReaderState::Terminated;
            }
        };

        debug!("Read line: {:?}", line);

        match line {
            OutputLine::Closed | OutputLine::EndOfText => ReaderState::Terminated,
            OutputLine::Blank => ReaderState::Running,
            OutputLine::Text(text) => {
                let transcript = Transcript {
                    text: self.accumulator.push(text),
                    language: self.language.clone(),
                };

                if self.events.send(transcript.to_event()).await.is_err() {
                    debug!("Event channel closed, stopping transcript reader");
                    return ReaderState::Terminated;
                }

                self.counters
                    .transcripts_emitted
                    .fetch_add(1, Ordering::SeqCst);

                ReaderState::Running
            }
        }
    }
}
