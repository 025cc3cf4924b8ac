//! # Bit Codec
//!
//! Converts a framed payload string into the bit sequence that gets written
//! into pixel LSBs, and back.
//!
//! ## Format
//!
//! ```text
//! [payload chars, 8 bits each, MSB first] [sentinel "#####", 40 bits]
//! ```
//!
//! Every character is written as one byte, so only code points 0–255 are
//! representable. Anything wider is rejected rather than truncated.
//!
//! There is no length header: decoding stops as soon as the accumulated bytes
//! end with the sentinel. The sentinel is not escaped, so callers must keep it
//! out of the payload (see `service`).

use crate::error::{InkError, Result};

/// End-of-payload marker appended to every encoded payload.
pub const SENTINEL: &str = "#####";

/// Number of bits per encoded character.
const BITS_PER_CHAR: usize = 8;

/// Ordered sequence of bits, one `0`/`1` value per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<u8>,
}

impl BitStream {
    /// Number of bits in the stream.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Iterate over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.bits.iter().copied()
    }
}

impl FromIterator<u8> for BitStream {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().map(|b| b & 1).collect(),
        }
    }
}

/// Result of decoding a bit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Sentinel found; payload with the sentinel stripped.
    Message(String),
    /// All bits consumed without seeing the sentinel. Covers both "nothing
    /// embedded" and "embedded data corrupted"; the two cannot be told apart.
    NoMessage,
}

/// Encode a framed payload, appending the sentinel.
///
/// # Errors
/// - [`InkError::Encoding`] if any character's code point exceeds 255
pub fn encode(framed: &str) -> Result<BitStream> {
    let mut bits = Vec::with_capacity((framed.len() + SENTINEL.len()) * BITS_PER_CHAR);

    for (position, ch) in framed.chars().chain(SENTINEL.chars()).enumerate() {
        let byte = u8::try_from(u32::from(ch)).map_err(|_| InkError::Encoding {
            code_point: u32::from(ch),
            position,
        })?;

        for shift in (0..BITS_PER_CHAR).rev() {
            bits.push((byte >> shift) & 1);
        }
    }

    Ok(BitStream { bits })
}

/// Decode a complete bit stream.
///
/// A trailing group of fewer than 8 bits is ignored.
pub fn decode(bits: &BitStream) -> Decoded {
    let mut decoder = SentinelDecoder::new();
    for bit in bits.iter() {
        if decoder.push(bit) {
            break;
        }
    }
    decoder.finish()
}

/// Incremental decoder fed one bit at a time.
///
/// Lets extraction stop reading pixels as soon as the sentinel shows up
/// instead of collecting the whole image first.
#[derive(Debug, Default)]
pub struct SentinelDecoder {
    bytes: Vec<u8>,
    current: u8,
    filled: usize,
    done: bool,
}

impl SentinelDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next bit. Returns `true` once the sentinel has been matched;
    /// further bits are ignored after that.
    pub fn push(&mut self, bit: u8) -> bool {
        if self.done {
            return true;
        }

        self.current = (self.current << 1) | (bit & 1);
        self.filled += 1;

        if self.filled == BITS_PER_CHAR {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
            self.done = self.bytes.ends_with(SENTINEL.as_bytes());
        }

        self.done
    }

    /// Number of complete bytes decoded so far, sentinel included.
    pub fn decoded_len(&self) -> usize {
        self.bytes.len()
    }

    /// Consume the decoder and produce the result.
    pub fn finish(mut self) -> Decoded {
        if !self.done {
            return Decoded::NoMessage;
        }

        self.bytes.truncate(self.bytes.len() - SENTINEL.len());
        Decoded::Message(self.bytes.iter().map(|&b| char::from(b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(s: &str) -> Vec<u8> {
        s.bytes().map(|c| c - b'0').collect()
    }

    #[test]
    fn test_encode_is_msb_first_with_sentinel() {
        let stream = encode("A").unwrap();

        assert_eq!(stream.len(), 8 * (1 + SENTINEL.len()));
        let first: Vec<u8> = stream.iter().take(8).collect();
        assert_eq!(first, bits_of("01000001"));
        let second: Vec<u8> = stream.iter().skip(8).take(8).collect();
        assert_eq!(second, bits_of("00100011")); // '#'
    }

    #[test]
    fn test_encode_rejects_wide_code_points() {
        let err = encode("ok\u{263A}").unwrap_err();
        assert_eq!(
            err,
            InkError::Encoding {
                code_point: 0x263A,
                position: 2
            }
        );
    }

    #[test]
    fn test_latin1_range_roundtrips() {
        let message = "caf\u{e9} \u{ff}\u{80}";
        let stream = encode(message).unwrap();
        assert_eq!(decode(&stream), Decoded::Message(message.to_string()));
    }

    #[test]
    fn test_empty_payload_is_still_a_message() {
        let stream = encode("").unwrap();
        assert_eq!(decode(&stream), Decoded::Message(String::new()));
    }

    #[test]
    fn test_missing_sentinel_is_no_message() {
        let stream: BitStream = bits_of("0100000101000010").into_iter().collect();
        assert_eq!(decode(&stream), Decoded::NoMessage);
        assert_eq!(decode(&BitStream::default()), Decoded::NoMessage);
    }

    #[test]
    fn test_trailing_partial_byte_is_ignored() {
        let mut raw: Vec<u8> = encode("hi").unwrap().iter().collect();
        // Cut into the last sentinel byte: it can no longer match.
        raw.truncate(raw.len() - 3);
        let stream: BitStream = raw.into_iter().collect();
        assert_eq!(decode(&stream), Decoded::NoMessage);
    }

    #[test]
    fn test_decoding_stops_at_first_sentinel() {
        let mut raw: Vec<u8> = encode("first").unwrap().iter().collect();
        raw.extend(encode("second").unwrap().iter());
        let stream: BitStream = raw.into_iter().collect();
        assert_eq!(decode(&stream), Decoded::Message("first".to_string()));
    }

    #[test]
    fn test_incremental_decoder_reports_completion() {
        let stream = encode("xy").unwrap();
        let mut decoder = SentinelDecoder::new();

        let consumed = stream.iter().take_while(|&bit| !decoder.push(bit)).count();

        // take_while drops the bit that completed the sentinel.
        assert_eq!(consumed + 1, stream.len());
        assert_eq!(decoder.decoded_len(), 2 + SENTINEL.len());
        assert_eq!(decoder.finish(), Decoded::Message("xy".to_string()));
    }
}
