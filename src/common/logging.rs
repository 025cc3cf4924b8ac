//! Logger setup shared by the binaries.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`. Defaults to `default_level`;
/// `RUST_LOG` overrides it.
pub fn init_logger(default_level: LevelFilter) {
    Builder::from_env(Env::default().default_filter_or(default_level.as_str()))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}
