//! # Message Encryption
//!
//! Password-based sealing of hidden messages and the `ENC:` payload framing.

pub mod envelope;

pub use envelope::{derive_key, open, seal, Envelope, SealedPayload, ENCRYPTED_PREFIX};
