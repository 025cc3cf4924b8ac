//! # Password Envelope
//!
//! Authenticated encryption of hidden messages.
//!
//! ## Sealed text format
//!
//! ```text
//! base64( salt (16 bytes) || nonce (12 bytes) || ciphertext + GCM tag (16 bytes) )
//! ```
//!
//! The key is derived with PBKDF2-HMAC-SHA256 (100 000 iterations) from the
//! password and the per-message salt, then used with AES-256-GCM and no
//! associated data. Salt and nonce are drawn from `OsRng` on every call, and a
//! fresh salt means a fresh key, so a nonce never repeats under one key.
//!
//! ## Framing
//!
//! Whether a payload is encrypted is carried outside the AEAD by a textual
//! prefix: `ENC:<sealed text>`. Anything without the prefix is plain text.
//!
//! ## Security Notes
//!
//! - Derived keys are zeroized on drop
//! - Every `open` failure is reported as [`InkError::AuthenticationFailure`],
//!   whatever the cause (bad base64, truncated input, tag mismatch)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{InkError, Result};

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Discriminant marking an encrypted framed payload.
pub const ENCRYPTED_PREFIX: &str = "ENC:";

/// Payload as it is framed before bit encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Message stored as-is.
    Plain(String),
    /// Base64 sealed text produced by [`seal`].
    Encrypted(String),
}

impl Envelope {
    /// Render the framed payload string.
    pub fn frame(&self) -> String {
        match self {
            Self::Plain(message) => message.clone(),
            Self::Encrypted(sealed) => format!("{ENCRYPTED_PREFIX}{sealed}"),
        }
    }

    /// Split a framed payload on the `ENC:` discriminant.
    pub fn parse(framed: String) -> Self {
        match framed.strip_prefix(ENCRYPTED_PREFIX) {
            Some(sealed) => Self::Encrypted(sealed.to_string()),
            None => Self::Plain(framed),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

/// Binary layout of a sealed message.
#[derive(Debug, Clone)]
pub struct SealedPayload {
    /// KDF salt.
    pub salt: [u8; SALT_LEN],
    /// AES-GCM nonce.
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Serialize as base64(salt || nonce || ciphertext).
    pub fn to_text(&self) -> String {
        let mut combined = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        combined.extend_from_slice(&self.salt);
        combined.extend_from_slice(&self.nonce);
        combined.extend_from_slice(&self.ciphertext);
        general_purpose::STANDARD.encode(combined)
    }

    /// Parse sealed text.
    ///
    /// # Errors
    /// - [`InkError::AuthenticationFailure`] if the text is not base64 or is too
    ///   short to hold salt, nonce and tag
    pub fn from_text(sealed: &str) -> Result<Self> {
        let combined = general_purpose::STANDARD
            .decode(sealed.trim())
            .map_err(|e| {
                debug!("sealed text is not valid base64: {}", e);
                InkError::AuthenticationFailure
            })?;

        if combined.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            debug!("sealed text too short: {} bytes", combined.len());
            return Err(InkError::AuthenticationFailure);
        }

        let (salt, rest) = combined.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let mut payload = Self {
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        payload.salt.copy_from_slice(salt);
        payload.nonce.copy_from_slice(nonce);
        Ok(payload)
    }
}

/// Stretch a password into a 32-byte AES key.
pub fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, KDF_ITERATIONS, &mut *key);
    key
}

/// Encrypt a message under a password and return the sealed base64 text.
///
/// # Errors
/// - [`InkError::AuthenticationFailure`] if the cipher refuses the input
///   (only possible for plaintexts beyond the AES-GCM length limit)
pub fn seal(message: &str, password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), message.as_bytes())
        .map_err(|_| InkError::AuthenticationFailure)?;

    Ok(SealedPayload {
        salt,
        nonce,
        ciphertext,
    }
    .to_text())
}

/// Decrypt sealed text produced by [`seal`].
///
/// # Errors
/// - [`InkError::AuthenticationFailure`] on a wrong password, tampered data,
///   malformed input, or a plaintext that is not UTF-8
pub fn open(sealed: &str, password: &str) -> Result<String> {
    let payload = SealedPayload::from_text(sealed)?;

    let key = derive_key(password, &payload.salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&payload.nonce), payload.ciphertext.as_slice())
            .map_err(|_| InkError::AuthenticationFailure)?,
    );

    String::from_utf8(plaintext.to_vec()).map_err(|_| InkError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let sealed = seal("secret", "pw1").unwrap();
        assert_eq!(open(&sealed, "pw1").unwrap(), "secret");
    }

    #[test]
    fn test_wrong_password_fails_closed() {
        let sealed = seal("secret", "pw1").unwrap();
        assert_eq!(open(&sealed, "pw2"), Err(InkError::AuthenticationFailure));
    }

    #[test]
    fn test_sealed_layout() {
        let sealed = seal("hello", "pw").unwrap();
        let payload = SealedPayload::from_text(&sealed).unwrap();
        assert_eq!(payload.ciphertext.len(), "hello".len() + TAG_LEN);
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let a = SealedPayload::from_text(&seal("same", "pw").unwrap()).unwrap();
        let b = SealedPayload::from_text(&seal("same", "pw").unwrap()).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let mut payload = SealedPayload::from_text(&seal("secret", "pw").unwrap()).unwrap();
        payload.ciphertext[0] ^= 0x01;
        assert_eq!(
            open(&payload.to_text(), "pw"),
            Err(InkError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_malformed_input_is_authentication_failure() {
        assert_eq!(open("not base64 !!", "pw"), Err(InkError::AuthenticationFailure));
        let short = general_purpose::STANDARD.encode([0u8; SALT_LEN + NONCE_LEN]);
        assert_eq!(open(&short, "pw"), Err(InkError::AuthenticationFailure));
        assert_eq!(open("", "pw"), Err(InkError::AuthenticationFailure));
    }

    #[test]
    fn test_derive_key_is_deterministic_per_salt() {
        let salt = [7u8; SALT_LEN];
        assert_eq!(*derive_key("pw", &salt), *derive_key("pw", &salt));
        assert_ne!(*derive_key("pw", &salt), *derive_key("pw", &[8u8; SALT_LEN]));
    }

    #[test]
    fn test_envelope_framing() {
        let plain = Envelope::Plain("hi".to_string());
        assert_eq!(plain.frame(), "hi");
        assert_eq!(Envelope::parse("hi".to_string()), plain);

        let enc = Envelope::Encrypted("QUJD".to_string());
        assert_eq!(enc.frame(), "ENC:QUJD");
        assert_eq!(Envelope::parse("ENC:QUJD".to_string()), enc);
        assert!(enc.is_encrypted());
    }

    #[test]
    fn test_encrypted_envelope_carries_sealed_text() {
        let sealed = seal("hi", "pw").unwrap();
        let Envelope::Encrypted(text) = Envelope::parse(format!("ENC:{sealed}")) else {
            panic!("expected an encrypted envelope");
        };
        assert_eq!(text, sealed);
        assert_eq!(open(&text, "pw").unwrap(), "hi");

        // Junk after the prefix is still an encrypted envelope; it fails at open.
        let Envelope::Encrypted(junk) = Envelope::parse("ENC:not base64!".to_string()) else {
            panic!("expected an encrypted envelope");
        };
        assert_eq!(open(&junk, "pw"), Err(InkError::AuthenticationFailure));
    }
}
