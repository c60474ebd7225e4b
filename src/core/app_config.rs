// Application Configuration
// Defaults compiled from config.yaml at build time
// Modify config.yaml and rebuild to change these values

use super::events::LogLevelMask;
use super::job::SyncMode;

// Include the auto-generated config from build.rs
pub mod compiled {
    include!(concat!(env!("OUT_DIR"), "/compiled_config.rs"));
}

/// Built-in defaults for jobs that leave settings unspecified
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Default job settings
    pub defaults: DefaultSettings,

    /// Exclusion patterns added to every job loaded from a jobs file
    pub global_excludes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DefaultSettings {
    pub mode: SyncMode,

    /// Format for the timestamp in versioned file names
    pub date_format: String,

    pub log_level: LogLevelMask,
}

// build.rs rejects unknown modes and categories, so the fallbacks are never taken
impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            mode: compiled::SYNC_MODE.parse().unwrap_or_default(),
            date_format: compiled::DATE_FORMAT.to_string(),
            log_level: LogLevelMask::from_names(compiled::LOG_LEVEL).unwrap_or_default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultSettings::default(),
            global_excludes: compiled::GLOBAL_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
