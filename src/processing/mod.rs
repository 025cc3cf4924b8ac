//! # Image Processing and Steganography
//!
//! This module hides bit streams in carrier images using LSB (Least Significant Bit)
//! substitution over the R, G and B channels.

pub mod steganography;

// Re-export main functions for convenience
pub use steganography::{
    capacity, embed, encode_png, extract, extract_message, load_carrier, open_carrier, save_png,
};
