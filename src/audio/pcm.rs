/// Divisor mapping signed 16-bit samples into [-1.0, 1.0]
const I16_SCALE: f32 = 32768.0;

/// Marker written to the whisper process after the last sample of a segment
///
/// Quiet NaN (0x7fc00000) in little-endian byte order.
pub const SEGMENT_BOUNDARY: [u8; 4] = [0x00, 0x00, 0xc0, 0x7f];

/// Convert signed 16-bit little-endian PCM into 32-bit float little-endian PCM
///
/// A trailing odd byte is dropped.
pub fn pcm16_to_f32_bytes(pcm: &[u8]) -> Vec<u8> {
    pcm.chunks_exact(2)
        .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / I16_SCALE)
        .flat_map(f32::to_le_bytes)
        .collect()
}
