pub mod convert;
pub mod pcm;

pub use convert::AudioChunkConverter;
pub use pcm::{pcm16_to_f32_bytes, SEGMENT_BOUNDARY};
