// Unit tests for the event protocol framing and typed messages

use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncWriteExt, BufReader};
use whisper_stream_bridge::config::WhisperConfig;
use whisper_stream_bridge::protocol::{
    read_event, write_event, AudioChunk, AudioStop, Describe, Event, EventMessage, Info,
    Transcribe, Transcript, MAX_DATA_LENGTH, MAX_HEADER_LENGTH, MAX_PAYLOAD_LENGTH,
};

#[tokio::test]
async fn test_audio_chunk_over_the_wire() -> Result<()> {
    let chunk = AudioChunk {
        rate: 16000,
        width: 2,
        channels: 1,
        audio: vec![1, 2, 3, 4],
        timestamp: Some(1000),
    };

    let mut wire = Vec::new();
    write_event(&mut wire, &chunk.to_event()).await?;

    let mut reader = BufReader::new(&wire[..]);
    let event = read_event(&mut reader).await?.expect("event");

    assert!(AudioChunk::is_type(&event.event_type));
    assert_eq!(AudioChunk::from_event(&event)?, chunk);
    assert!(read_event(&mut reader).await?.is_none(), "Stream should be exhausted");

    Ok(())
}

#[tokio::test]
async fn test_header_layout() -> Result<()> {
    let transcript = Transcript {
        text: "hello world".to_string(),
        language: None,
    };

    let mut wire = Vec::new();
    write_event(&mut wire, &transcript.to_event()).await?;

    let newline = wire.iter().position(|&b| b == b'\n').expect("header line");
    let header: serde_json::Value = serde_json::from_slice(&wire[..newline])?;
    let data = &wire[newline + 1..];

    assert_eq!(header["type"], "transcript");
    assert_eq!(header["data_length"], data.len());
    assert!(header.get("payload_length").is_none());
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(data)?,
        json!({ "text": "hello world" })
    );

    Ok(())
}

#[tokio::test]
async fn test_inline_data_merged_with_data_block() -> Result<()> {
    let block = br#"{"language":"de"}"#;
    let header = format!(
        "{{\"type\":\"transcribe\",\"data\":{{\"name\":\"tiny\",\"language\":\"en\"}},\"data_length\":{}}}\n",
        block.len()
    );

    let (mut client, server) = tokio::io::duplex(1024);
    client.write_all(header.as_bytes()).await?;
    client.write_all(block).await?;
    drop(client);

    let mut reader = BufReader::new(server);
    let event = read_event(&mut reader).await?.expect("event");
    let transcribe = Transcribe::from_event(&event)?;

    assert_eq!(transcribe.name.as_deref(), Some("tiny"));
    assert_eq!(transcribe.language.as_deref(), Some("de"));

    Ok(())
}

#[tokio::test]
async fn test_blank_lines_between_events_skipped() -> Result<()> {
    let wire = b"\n\n{\"type\":\"describe\"}\n{\"type\":\"audio-stop\"}\n";
    let mut reader = BufReader::new(&wire[..]);

    let first = read_event(&mut reader).await?.expect("describe");
    let second = read_event(&mut reader).await?.expect("audio-stop");

    assert!(Describe::is_type(&first.event_type));
    assert!(AudioStop::is_type(&second.event_type));
    assert_eq!(AudioStop::from_event(&second)?, AudioStop::default());

    Ok(())
}

#[tokio::test]
async fn test_invalid_header_is_an_error() {
    let mut reader = BufReader::new(&b"not json\n"[..]);

    assert!(read_event(&mut reader).await.is_err());
}

#[tokio::test]
async fn test_truncated_payload_is_an_error() {
    let wire = b"{\"type\":\"audio-chunk\",\"data\":{\"rate\":16000,\"width\":2,\"channels\":1},\"payload_length\":8}\n\x01\x02";
    let mut reader = BufReader::new(&wire[..]);

    assert!(read_event(&mut reader).await.is_err());
}

#[tokio::test]
async fn test_oversized_payload_length_rejected() {
    let wire = format!(
        "{{\"type\":\"audio-chunk\",\"payload_length\":{}}}\n",
        usize::MAX / 2
    );
    let mut reader = BufReader::new(wire.as_bytes());

    let err = read_event(&mut reader)
        .await
        .expect_err("Payload over the limit should be rejected before reading");
    assert!(err.to_string().contains("payload length"));
}

#[tokio::test]
async fn test_payload_just_over_limit_rejected() {
    let wire = format!(
        "{{\"type\":\"audio-chunk\",\"payload_length\":{}}}\n",
        MAX_PAYLOAD_LENGTH + 1
    );
    let mut reader = BufReader::new(wire.as_bytes());

    assert!(read_event(&mut reader).await.is_err());
}

#[tokio::test]
async fn test_oversized_data_length_rejected() {
    let wire = format!(
        "{{\"type\":\"transcribe\",\"data_length\":{}}}\n",
        MAX_DATA_LENGTH + 1
    );
    let mut reader = BufReader::new(wire.as_bytes());

    let err = read_event(&mut reader)
        .await
        .expect_err("Data block over the limit should be rejected");
    assert!(err.to_string().contains("data length"));
}

#[tokio::test]
async fn test_oversized_header_line_rejected() {
    let mut wire = vec![b' '; MAX_HEADER_LENGTH as usize + 16];
    wire.push(b'\n');
    let mut reader = BufReader::new(&wire[..]);

    assert!(read_event(&mut reader).await.is_err());
}

#[test]
fn test_audio_chunk_requires_format() {
    let event = Event::new("audio-chunk").with_payload(vec![0, 0]);

    assert!(AudioChunk::from_event(&event).is_err());
}

#[test]
fn test_info_describes_configured_model() -> Result<()> {
    let config = WhisperConfig {
        binary: "whisper-stream".to_string(),
        model: "models/ggml-base.en.bin".to_string(),
        language: Some("en".to_string()),
        threads: 4,
        extra_args: Vec::new(),
    };

    let info = Info::from_config(&config);
    let event = info.to_event();

    assert!(Info::is_type(&event.event_type));
    assert_eq!(Info::from_event(&event)?, info);

    let model = &info.asr[0].models[0];
    assert_eq!(model.name, "ggml-base.en");
    assert_eq!(model.languages, vec!["en".to_string()]);
    assert!(model.installed);

    Ok(())
}

#[test]
fn test_info_lists_all_languages_without_hint() {
    let config = WhisperConfig {
        binary: "whisper-stream".to_string(),
        model: "model.bin".to_string(),
        language: None,
        threads: 1,
        extra_args: Vec::new(),
    };

    let info = Info::from_config(&config);
    let languages = &info.asr[0].models[0].languages;

    assert!(languages.len() > 90);
    assert!(languages.contains(&"en".to_string()));
}
