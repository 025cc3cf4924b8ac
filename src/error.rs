//! # Error Types
//!
//! [`InkError`] is the single failure type returned by every core operation.
//! Library errors from `image`, `base64` and `aes-gcm` are mapped into it at the
//! module boundary so none of them leak to callers.

use thiserror::Error;

/// Failures of the hide/reveal pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InkError {
    /// The payload needs more bits than the carrier has channels.
    #[error("message is too long for this image: need {required} bits, have {available}")]
    CapacityExceeded {
        /// Bits needed for payload plus sentinel.
        required: u64,
        /// `width * height * 3` of the carrier.
        available: u64,
    },

    /// A character outside the single-byte range (code point > 255).
    #[error("character U+{code_point:04X} at position {position} cannot be encoded in a single byte")]
    Encoding {
        /// Offending code point.
        code_point: u32,
        /// Character index in the framed payload.
        position: usize,
    },

    /// Plain text that would be misread by the framing layer.
    #[error("message contains reserved content: {0}")]
    ReservedContent(String),

    /// Wrong password, tampered ciphertext or malformed sealed text.
    #[error("decryption failed: wrong password or corrupted data")]
    AuthenticationFailure,

    /// Too many failed attempts from this identity.
    #[error("too many failed attempts, locked out for {remaining_secs}s")]
    LockedOut {
        /// Seconds until the lockout window ends (rounded up).
        remaining_secs: u64,
    },

    /// Image decode/encode or file access failed.
    #[error("I/O failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for InkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<image::ImageError> for InkError {
    fn from(e: image::ImageError) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, InkError>;
