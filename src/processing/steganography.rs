//! # LSB Steganography Implementation
//!
//! Hides a bit stream in the least significant bit of each colour channel
//! (R, G, B) of a carrier image, and reads it back.
//!
//! ## Algorithm
//!
//! ### Embedding
//! 1. Normalize the carrier to 8-bit RGB (alpha is dropped)
//! 2. Check `bits <= width * height * 3` before touching anything
//! 3. Copy the carrier, then for each bit in order:
//!    - Clear the LSB of the next channel and set it to the data bit
//!    - Move to next channel (R → G → B → next pixel, row-major)
//! 4. Channels past the end of the payload are left untouched
//!
//! ### Extraction
//! Walks the channels in the same order and feeds each LSB into a
//! [`SentinelDecoder`], stopping at the first sentinel. There is no length
//! header, so a carrier without a message is scanned to the end.
//!
//! ### Capacity
//! An image stores `width * height * 3` bits, i.e. roughly
//! `(width * height * 3) / 8 - 5` characters once the sentinel is accounted for.
//!
//! Output must always be written losslessly: any lossy re-encode flips LSBs
//! and destroys the payload. [`encode_png`] and [`save_png`] are the only
//! writers.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use log::debug;

use crate::codec::{BitStream, Decoded, SentinelDecoder};
use crate::error::{InkError, Result};

/// Usable channels per pixel.
const CHANNELS: usize = 3;

/// Number of bits the carrier can hold.
pub fn capacity(image: &RgbImage) -> u64 {
    u64::from(image.width()) * u64::from(image.height()) * CHANNELS as u64
}

/// Embed a bit stream into a copy of the carrier.
///
/// The input image is never modified. On a capacity failure no output is
/// produced at all.
///
/// # Errors
/// - [`InkError::CapacityExceeded`] if the stream is longer than [`capacity`]
pub fn embed(image: &RgbImage, bits: &BitStream) -> Result<RgbImage> {
    let required = bits.len() as u64;
    let available = capacity(image);

    if required > available {
        return Err(InkError::CapacityExceeded {
            required,
            available,
        });
    }

    debug!(
        "Hiding {} bits in a {}x{} image",
        required,
        image.width(),
        image.height()
    );

    let mut output = image.clone();
    let mut data = bits.iter();

    'outer: for pixel in output.pixels_mut() {
        for channel in 0..CHANNELS {
            let Some(bit) = data.next() else {
                break 'outer;
            };

            // Clear LSB and set it to our data bit
            pixel[channel] = (pixel[channel] & 0xFE) | bit;
        }
    }

    Ok(output)
}

/// Lazily walk every channel LSB in embedding order.
fn lsb_stream(image: &RgbImage) -> impl Iterator<Item = u8> + '_ {
    image
        .pixels()
        .flat_map(|pixel| pixel.0.into_iter().map(|value| value & 1))
}

/// Read the LSB of every channel of the carrier.
///
/// Produces exactly [`capacity`] bits. Prefer [`extract_message`] when only
/// the hidden text is wanted.
pub fn extract(image: &RgbImage) -> BitStream {
    lsb_stream(image).collect()
}

/// Extract and decode in one pass, stopping at the sentinel.
pub fn extract_message(image: &RgbImage) -> Decoded {
    let mut decoder = SentinelDecoder::new();

    for bit in lsb_stream(image) {
        if decoder.push(bit) {
            debug!("Sentinel found after {} bytes", decoder.decoded_len());
            break;
        }
    }

    decoder.finish()
}

/// Decode a carrier from raw file bytes, in any format the `image` crate reads.
///
/// # Errors
/// - [`InkError::Io`] if the bytes are not a readable image
pub fn load_carrier(image_bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(image_bytes)?.to_rgb8())
}

/// Open a carrier from disk.
///
/// The format is sniffed from the file contents, not the extension, so a
/// PNG saved under a `.jpg` name still opens losslessly.
///
/// # Errors
/// - [`InkError::Io`] if the file cannot be read or decoded
pub fn open_carrier(path: &Path) -> Result<RgbImage> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?.to_rgb8())
}

/// Encode the image as PNG bytes.
///
/// # Errors
/// - [`InkError::Io`] if PNG encoding fails
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut output_bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut output_bytes), ImageFormat::Png)?;
    Ok(output_bytes)
}

/// Write the image to disk as PNG, whatever extension `path` has.
///
/// # Errors
/// - [`InkError::Io`] if the file cannot be written
pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
