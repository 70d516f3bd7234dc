//! Bidirectional SSTV codec
//!
//! Converts raster images to and from audio-band FM waveforms compatible
//! with amateur-radio slow-scan television. Supports Robot 36 (YUV,
//! 320x240), Martin M1 and Scottie S1 (RGB, 320x256), with VIS mode
//! negotiation, per-line sync tracking and a choice of Goertzel or
//! FM phase-difference frequency estimation.

pub mod color;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fm;
pub mod goertzel;
pub mod modes;
pub mod raster;
pub mod sync;
pub mod tone;
pub mod tracing_init;
pub mod vis;
pub mod wav;

pub use decoder::{decode, DecodeResult, DecoderConfig, FrontEnd};
pub use encoder::Encoder;
pub use error::SstvError;
pub use modes::{ColorFormat, Mode};
pub use raster::Raster;
