//! File logging for the terminal client.
//!
//! The alternate screen owns stdout/stderr, so records go to
//! `<cache_dir>/policybot/policybot.log`.

use std::fs::{self, File};
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

pub fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("policybot").join("policybot.log"))
}

/// Unknown level names fall back to `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::Info)
}

/// Install the file logger. Returns the log file path when it could be
/// created; logging is silently disabled otherwise.
pub fn initialize(level: &str) -> Option<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = File::create(&path).ok()?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();
    WriteLogger::init(parse_level(level), config, file).ok()?;
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }
}
