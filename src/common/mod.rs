//! # Common Components
//!
//! Shared utilities used by both binaries.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration loading
//! - [`logging`]: Logger initialization

pub mod config;
pub mod logging;
