//! # Invisible Ink
//!
//! Hides text messages in the least significant bits of image pixels, with
//! optional password protection (PBKDF2 + AES-256-GCM) and per-client
//! throttling of wrong-password attempts.
//!
//! ```ignore
//! use invisible_ink::{hide_file, InkService, RevealOutcome};
//!
//! hide_file("cat.jpg".as_ref(), "meet at noon", Some("pw"), "cat.png".as_ref())?;
//!
//! let service = InkService::default();
//! match service.reveal_file("local", "cat.png".as_ref(), Some("pw"))? {
//!     RevealOutcome::Message(text) => println!("{text}"),
//!     other => println!("{other:?}"),
//! }
//! ```

pub mod codec;
pub mod common;
pub mod crypto;
pub mod error;
pub mod processing;
pub mod service;
pub mod throttle;

pub use error::{InkError, Result};
pub use service::{hide, hide_bytes, hide_file, HideOutcome, InkService, RevealOutcome};
pub use throttle::{AttemptThrottle, Gate, ThrottleConfig};
