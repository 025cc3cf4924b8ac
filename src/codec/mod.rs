//! # Payload Codec
//!
//! Text-to-bit serialization used by the pixel layer.

pub mod bits;

pub use bits::{decode, encode, BitStream, Decoded, SentinelDecoder, SENTINEL};
