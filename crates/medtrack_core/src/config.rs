//! Runtime configuration shared by adapters.
//!
//! # Responsibility
//! - Hold store location, logging setup and reminder polling period.
//! - Validate values before any subsystem starts.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_FILE_NAME: &str = "medtrack.sqlite3";
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    PollIntervalOutOfRange(u64),
    EmptyPath(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PollIntervalOutOfRange(value) => write!(
                f,
                "poll interval {value}s out of range; expected 1..={MAX_POLL_INTERVAL_SECS}"
            ),
            Self::EmptyPath(field) => write!(f, "{field} cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Effective settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl AppConfig {
    /// Checks ranges and resolves relative paths against `base_dir`.
    ///
    /// `log_dir` must end up absolute for `init_logging`.
    pub fn resolved(mut self, base_dir: &std::path::Path) -> Result<Self, ConfigError> {
        let secs = self.poll_interval.as_secs();
        if secs == 0 || secs > MAX_POLL_INTERVAL_SECS {
            return Err(ConfigError::PollIntervalOutOfRange(secs));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("db path"));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("log dir"));
        }
        if self.db_path.is_relative() {
            self.db_path = base_dir.join(&self.db_path);
        }
        if self.log_dir.is_relative() {
            self.log_dir = base_dir.join(&self.log_dir);
        }
        Ok(self)
    }
}
