//! Logger installation for the binary
//!
//! Library code only uses the `log` macros; this sets up `simplelog` with a
//! stderr terminal logger and an optional debug-level file logger.

use std::fs::{self, OpenOptions};
use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use crate::error::{PackError, PackResult};

/// Console level from an explicit level and the `-v` count
///
/// `-v` raises the level to at least info, `-vv` to debug.
pub fn console_level(explicit: LevelFilter, verbose: u8) -> LevelFilter {
    let from_verbose = match verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    explicit.max(from_verbose)
}

/// Install the global logger
///
/// # Errors
///
/// Returns a configuration error if the log file cannot be opened or a
/// logger is already installed.
pub fn init_logging(console: LevelFilter, log_file: Option<&Path>) -> PackResult<()> {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        console,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                PackError::Config(format!("Cannot open log file {}: {}", path.display(), e))
            })?;
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }

    CombinedLogger::init(loggers)
        .map_err(|e| PackError::Config(format!("Failed to initialize logging: {}", e)))
}
