//! # Hide / Reveal Service
//!
//! Wires the pieces together:
//!
//! ```text
//! hide:   message → [seal] → frame ("ENC:" prefix) → bit codec → LSB embed → PNG
//! reveal: throttle gate → LSB extract + sentinel scan → unframe → [open] → throttle report
//! ```
//!
//! The web server and the CLI are thin wrappers over [`InkService`] and the
//! free `hide_*` functions. Hiding needs no shared state; revealing consults
//! the throttle owned by the service.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbImage;
use log::{debug, info, warn};

use crate::codec::{self, Decoded, SENTINEL};
use crate::crypto::{self, Envelope, ENCRYPTED_PREFIX};
use crate::error::{InkError, Result};
use crate::processing::steganography;
use crate::throttle::{AttemptThrottle, Gate, ThrottleConfig};

/// Successful hide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HideOutcome {
    /// Where the PNG carrier was written.
    pub output_path: PathBuf,
}

/// Every possible result of a reveal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The hidden (and, if needed, decrypted) text.
    Message(String),
    /// No sentinel in the carrier: nothing embedded, or the data is damaged.
    NoMessageFound,
    /// The payload is encrypted and no password was supplied.
    PasswordRequired,
    /// The password did not authenticate the payload.
    WrongPassword,
    /// This identity is locked out; nothing was extracted.
    LockedOut {
        /// Seconds until attempts are accepted again.
        remaining_secs: u64,
    },
}

/// Reject text the framing layer cannot carry unambiguously.
///
/// # Errors
/// - [`InkError::Encoding`] for code points above 255
/// - [`InkError::ReservedContent`] if the text contains the sentinel
fn validate_message(message: &str) -> Result<()> {
    if let Some((position, ch)) = message.chars().enumerate().find(|(_, c)| u32::from(*c) > 255) {
        return Err(InkError::Encoding {
            code_point: u32::from(ch),
            position,
        });
    }

    if message.contains(SENTINEL) {
        return Err(InkError::ReservedContent(format!(
            "the end marker {SENTINEL:?} cannot appear in a message"
        )));
    }

    Ok(())
}

/// Build the framed payload string for `message`.
///
/// An empty password counts as no password.
///
/// # Errors
/// - See [`validate_message`]; additionally a plain message may not start with
///   the `ENC:` prefix, since reveal would treat it as encrypted, nor end in
///   `#`, since the trailing marks would merge into the end marker
pub fn frame_payload(message: &str, password: Option<&str>) -> Result<String> {
    validate_message(message)?;

    let envelope = match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            info!("Encrypting message...");
            Envelope::Encrypted(crypto::seal(message, password)?)
        }
        None => {
            if message.starts_with(ENCRYPTED_PREFIX) {
                return Err(InkError::ReservedContent(format!(
                    "plain messages cannot start with {ENCRYPTED_PREFIX:?}; set a password instead"
                )));
            }
            if message.ends_with('#') {
                return Err(InkError::ReservedContent(format!(
                    "plain messages cannot end in '#'; it runs into the end marker {SENTINEL:?}"
                )));
            }
            Envelope::Plain(message.to_string())
        }
    };

    Ok(envelope.frame())
}

/// Hide `message` in a copy of `carrier`.
///
/// # Errors
/// - [`InkError::CapacityExceeded`] if the framed payload does not fit
/// - see [`frame_payload`]
pub fn hide(carrier: &RgbImage, message: &str, password: Option<&str>) -> Result<RgbImage> {
    let framed = frame_payload(message, password)?;
    let bits = codec::encode(&framed)?;
    steganography::embed(carrier, &bits)
}

/// Hide `message` in an image given as raw bytes; returns PNG bytes.
///
/// # Errors
/// - [`InkError::Io`] if the input is not a readable image
/// - see [`hide`]
pub fn hide_bytes(image_bytes: &[u8], message: &str, password: Option<&str>) -> Result<Vec<u8>> {
    let carrier = steganography::load_carrier(image_bytes)?;
    let output = hide(&carrier, message, password)?;
    steganography::encode_png(&output)
}

/// Hide `message` in the image at `input` and write a PNG to `output`.
///
/// Nothing is written when hiding fails.
///
/// # Errors
/// - [`InkError::Io`] on read/write failures
/// - see [`hide`]
pub fn hide_file(
    input: &Path,
    message: &str,
    password: Option<&str>,
    output: &Path,
) -> Result<HideOutcome> {
    let carrier = steganography::open_carrier(input)?;
    let hidden = hide(&carrier, message, password)?;
    steganography::save_png(&hidden, output)?;

    info!("Message hidden successfully in {}", output.display());
    Ok(HideOutcome {
        output_path: output.to_path_buf(),
    })
}

/// Reveal side of the system, owning the wrong-password throttle.
///
/// Create one per process and share it (e.g. behind an `Arc`).
///
/// Attempts from the same identity run one at a time: the gate, the decrypt
/// and the throttle report happen under a per-identity lock, so parallel
/// requests cannot all slip past the same `Open` gate.
#[derive(Debug, Default)]
pub struct InkService {
    throttle: AttemptThrottle,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InkService {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            throttle: AttemptThrottle::new(config),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn throttle(&self) -> &AttemptThrottle {
        &self.throttle
    }

    /// Fail fast when `identity` is locked out.
    ///
    /// # Errors
    /// - [`InkError::LockedOut`] while the lockout window is running
    pub fn ensure_open(&self, identity: &str) -> Result<()> {
        match self.throttle.check(identity) {
            Gate::Open => Ok(()),
            Gate::Locked { remaining_secs } => {
                warn!("Rejected reveal from {}: locked for {}s", identity, remaining_secs);
                Err(InkError::LockedOut { remaining_secs })
            }
        }
    }

    /// Lock serializing reveal attempts from `identity`.
    fn attempt_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(identity.to_string()).or_default())
    }

    fn gate(&self, identity: &str) -> Option<RevealOutcome> {
        match self.ensure_open(identity) {
            Err(InkError::LockedOut { remaining_secs }) => {
                Some(RevealOutcome::LockedOut { remaining_secs })
            }
            _ => None,
        }
    }

    /// Reveal the message hidden in `carrier` on behalf of `identity`.
    ///
    /// A locked identity gets [`RevealOutcome::LockedOut`] before any pixel is
    /// read. Only authentication failures count against the identity.
    pub fn reveal(&self, identity: &str, carrier: &RgbImage, password: Option<&str>) -> RevealOutcome {
        let lock = self.attempt_lock(identity);
        let _turn = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(locked) = self.gate(identity) {
            return locked;
        }
        self.reveal_open(identity, carrier, password)
    }

    /// Reveal from raw image bytes.
    ///
    /// # Errors
    /// - [`InkError::Io`] if the bytes are not a readable image
    pub fn reveal_bytes(
        &self,
        identity: &str,
        image_bytes: &[u8],
        password: Option<&str>,
    ) -> Result<RevealOutcome> {
        let lock = self.attempt_lock(identity);
        let _turn = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(locked) = self.gate(identity) {
            return Ok(locked);
        }
        let carrier = steganography::load_carrier(image_bytes)?;
        Ok(self.reveal_open(identity, &carrier, password))
    }

    /// Reveal from an image on disk.
    ///
    /// # Errors
    /// - [`InkError::Io`] if the file cannot be read or decoded
    pub fn reveal_file(
        &self,
        identity: &str,
        path: &Path,
        password: Option<&str>,
    ) -> Result<RevealOutcome> {
        let lock = self.attempt_lock(identity);
        let _turn = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(locked) = self.gate(identity) {
            return Ok(locked);
        }
        let carrier = steganography::open_carrier(path)?;
        Ok(self.reveal_open(identity, &carrier, password))
    }

    fn reveal_open(&self, identity: &str, carrier: &RgbImage, password: Option<&str>) -> RevealOutcome {
        let framed = match steganography::extract_message(carrier) {
            Decoded::Message(framed) => framed,
            Decoded::NoMessage => return RevealOutcome::NoMessageFound,
        };

        let sealed = match Envelope::parse(framed) {
            Envelope::Plain(message) => return RevealOutcome::Message(message),
            Envelope::Encrypted(sealed) => sealed,
        };

        let Some(password) = password.filter(|p| !p.is_empty()) else {
            return RevealOutcome::PasswordRequired;
        };

        match crypto::open(&sealed, password) {
            Ok(message) => {
                self.throttle.record_success(identity);
                RevealOutcome::Message(message)
            }
            Err(e) => {
                warn!("Decryption failed for {}: {}", identity, e);
                // The failure that trips the lockout still reports WrongPassword;
                // the next attempt gets LockedOut.
                if let Gate::Locked { remaining_secs } = self.throttle.record_failure(identity) {
                    debug!("{} must wait {}s before the next attempt", identity, remaining_secs);
                }
                RevealOutcome::WrongPassword
            }
        }
    }
}
