// End-to-end tests for a client connection
//
// A client talks the event protocol over an in-memory stream while the
// whisper process is simulated with duplex pipes.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use whisper_stream_bridge::protocol::{
    read_event, write_event, AudioChunk, AudioStop, Describe, EventMessage, Info, Transcript,
};
use whisper_stream_bridge::{serve_connection, ProcessStreams, SessionConfig, SEGMENT_BOUNDARY};

#[tokio::test]
async fn test_full_session_over_connection() -> Result<()> {
    let (process_input, mut whisper_stdin) = tokio::io::duplex(1 << 20);
    let (mut whisper_stdout, process_output) = tokio::io::duplex(1 << 16);
    let streams = ProcessStreams::new(process_input, process_output);

    let (client, server_side) = tokio::io::duplex(1 << 16);
    let info = Info::default();

    let server = tokio::spawn(serve_connection(
        server_side,
        "e2e".to_string(),
        streams,
        info.to_event(),
        SessionConfig::default(),
    ));

    let (client_read, mut client_write) = tokio::io::split(client);
    let mut client_read = BufReader::new(client_read);

    // Capability query
    write_event(&mut client_write, &Describe.to_event()).await?;
    let reply = timeout(Duration::from_secs(1), read_event(&mut client_read))
        .await??
        .expect("info");
    assert_eq!(Info::from_event(&reply)?, info);

    // Audio, then end of segment
    let chunk = AudioChunk {
        rate: 16000,
        width: 2,
        channels: 1,
        audio: [16384i16, -16384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect(),
        timestamp: None,
    };
    write_event(&mut client_write, &chunk.to_event()).await?;
    write_event(&mut client_write, &AudioStop::default().to_event()).await?;

    let mut written = [0u8; 12];
    timeout(Duration::from_secs(1), whisper_stdin.read_exact(&mut written)).await??;
    assert_eq!(&written[..4], &0.5f32.to_le_bytes());
    assert_eq!(&written[4..8], &(-0.5f32).to_le_bytes());
    assert_eq!(&written[8..], &SEGMENT_BOUNDARY);

    // Whisper output comes back as cumulative transcripts
    whisper_stdout.write_all(b"good\nmorning\n<|endoftext|>\n").await?;

    let mut texts = Vec::new();
    for _ in 0..2 {
        let event = timeout(Duration::from_secs(1), read_event(&mut client_read))
            .await??
            .expect("transcript");
        texts.push(Transcript::from_event(&event)?.text);
    }
    assert_eq!(texts, vec!["good", "good morning"]);

    // Closing the client ends the connection
    client_write.shutdown().await?;
    let stats = timeout(Duration::from_secs(1), server).await???;

    assert_eq!(stats.session_id, "e2e");
    assert_eq!(stats.chunks_forwarded, 1);
    assert_eq!(stats.bytes_forwarded, 8);
    assert_eq!(stats.segments_ended, 1);
    assert_eq!(stats.transcripts_emitted, 2);
    assert!(stats.reader_started);

    Ok(())
}

#[tokio::test]
async fn test_connection_fails_when_whisper_input_closed() -> Result<()> {
    let (process_input, whisper_stdin) = tokio::io::duplex(1024);
    let (_whisper_stdout, process_output) = tokio::io::duplex(1024);
    let streams = ProcessStreams::new(process_input, process_output);
    drop(whisper_stdin);

    let (client, server_side) = tokio::io::duplex(1 << 16);
    let server = tokio::spawn(serve_connection(
        server_side,
        "broken".to_string(),
        streams,
        Info::default().to_event(),
        SessionConfig::default(),
    ));

    let (_client_read, mut client_write) = tokio::io::split(client);
    write_event(&mut client_write, &AudioStop::default().to_event()).await?;

    let result = timeout(Duration::from_secs(1), server).await??;
    assert!(result.is_err(), "A closed whisper input should fail the connection");

    Ok(())
}
