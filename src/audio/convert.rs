use crate::protocol::AudioChunk;
use anyhow::{bail, Result};

/// Converts audio chunks to a fixed rate, sample width and channel count
///
/// Conversion is stateless: each chunk is converted on its own, so rate
/// conversion does not carry interpolation state across chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioChunkConverter {
    /// Target sample rate in Hz
    pub rate: u32,
    /// Target bytes per sample (1, 2 or 4)
    pub width: u16,
    /// Target channel count
    pub channels: u16,
}

impl AudioChunkConverter {
    pub fn new(rate: u32, width: u16, channels: u16) -> Self {
        Self {
            rate,
            width,
            channels,
        }
    }

    /// Convert a chunk to the target format
    pub fn convert(&self, chunk: AudioChunk) -> Result<AudioChunk> {
        if chunk.rate == self.rate && chunk.width == self.width && chunk.channels == self.channels
        {
            return Ok(chunk);
        }

        if chunk.channels == 0 || chunk.rate == 0 {
            bail!(
                "Invalid audio format: rate={} channels={}",
                chunk.rate,
                chunk.channels
            );
        }

        let mut samples = decode_samples(&chunk.audio, chunk.width)?;
        let mut channels = chunk.channels;

        if channels != self.channels {
            samples = remix(&samples, channels, self.channels);
            channels = self.channels;
        }

        if chunk.rate != self.rate {
            samples = resample(&samples, channels as usize, chunk.rate, self.rate);
        }

        Ok(AudioChunk {
            rate: self.rate,
            width: self.width,
            channels,
            audio: encode_samples(&samples, self.width)?,
            timestamp: chunk.timestamp,
        })
    }
}

/// Decode signed little-endian samples of the given width into 16-bit samples
fn decode_samples(audio: &[u8], width: u16) -> Result<Vec<i16>> {
    let samples = match width {
        1 => audio.iter().map(|&b| i16::from(b as i8) << 8).collect(),
        2 => audio
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect(),
        4 => audio
            .chunks_exact(4)
            .map(|b| (i32::from_le_bytes([b[0], b[1], b[2], b[3]]) >> 16) as i16)
            .collect(),
        other => bail!("Unsupported sample width: {} bytes", other),
    };

    Ok(samples)
}

fn encode_samples(samples: &[i16], width: u16) -> Result<Vec<u8>> {
    let bytes = match width {
        1 => samples.iter().map(|&s| (s >> 8) as i8 as u8).collect(),
        2 => samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        4 => samples
            .iter()
            .flat_map(|&s| (i32::from(s) << 16).to_le_bytes())
            .collect(),
        other => bail!("Unsupported sample width: {} bytes", other),
    };

    Ok(bytes)
}

/// Change the channel count, going through mono when both sides are multi-channel
fn remix(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    let mono: Vec<i16> = if from == 1 {
        samples.to_vec()
    } else {
        // Average channels of each frame
        samples
            .chunks_exact(from as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / i32::from(from)) as i16
            })
            .collect()
    };

    if to == 1 {
        return mono;
    }

    mono.iter()
        .flat_map(|&s| std::iter::repeat(s).take(to as usize))
        .collect()
}

/// Resample interleaved frames by linear interpolation
fn resample(samples: &[i16], channels: usize, from: u32, to: u32) -> Vec<i16> {
    let frames = samples.len() / channels;
    if frames == 0 || from == to {
        return samples.to_vec();
    }

    let out_frames = (frames as u64 * u64::from(to) / u64::from(from)) as usize;
    let step = f64::from(from) / f64::from(to);
    let mut resampled = Vec::with_capacity(out_frames * channels);

    for i in 0..out_frames {
        let position = i as f64 * step;
        let index = (position.floor() as usize).min(frames - 1);
        let next = (index + 1).min(frames - 1);
        let fraction = position - index as f64;

        for ch in 0..channels {
            let a = f64::from(samples[index * channels + ch]);
            let b = f64::from(samples[next * channels + ch]);
            let value = (a + (b - a) * fraction).round();
            resampled.push(value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16);
        }
    }

    resampled
}
