use log::LevelFilter;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Log targets used by the category macros below
pub const TARGET_API_CALLS: &str = "api_calls";
pub const TARGET_COMMENTS: &str = "comments";
pub const TARGET_STORAGE: &str = "storage";
pub const TARGET_GENERAL: &str = "general";

/// Logging configuration for the campus client
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Master switch to enable/disable all logging
    pub enabled: bool,
    /// Path to the log file
    pub log_file: PathBuf,
    /// Whether to clear the log file on startup
    pub clear_on_startup: bool,
    /// Feature flags for specific logging categories
    pub features: LogFeatures,
    /// Overall log level
    pub level: LevelFilter,
}

/// Feature flags for specific logging categories
#[derive(Debug, Clone)]
pub struct LogFeatures {
    /// Log backend requests and responses
    pub api_calls: bool,
    /// Log comment thread and like changes
    pub comments: bool,
    /// Log local store reads and writes
    pub storage: bool,
    /// Log general debug messages
    pub general: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: PathBuf::from("campus_debug.log"),
            clear_on_startup: true,
            features: LogFeatures::default(),
            level: LevelFilter::Info,
        }
    }
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            api_calls: true,
            comments: true,
            storage: true,
            general: true,
        }
    }
}

impl LogFeatures {
    /// Targets of the categories that are switched off
    pub fn disabled_targets(&self) -> Vec<&'static str> {
        [
            (self.api_calls, TARGET_API_CALLS),
            (self.comments, TARGET_COMMENTS),
            (self.storage, TARGET_STORAGE),
            (self.general, TARGET_GENERAL),
        ]
        .into_iter()
        .filter(|(enabled, _)| !enabled)
        .map(|(_, target)| target)
        .collect()
    }
}

impl LogConfig {
    /// Create a new log configuration with all features disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Create a minimal log configuration (only errors and warnings)
    pub fn minimal() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Warn,
            // comments and storage also carry warnings
            features: LogFeatures {
                api_calls: false,
                comments: true,
                storage: true,
                general: false,
            },
            ..Default::default()
        }
    }

    /// Create a verbose log configuration (all features enabled)
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Trace,
            features: LogFeatures::default(),
            ..Default::default()
        }
    }

    pub fn with_log_file(mut self, log_file: PathBuf) -> Self {
        self.log_file = log_file;
        self
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    if !config.enabled {
        // Initialize with no-op logger
        let _ = WriteLogger::init(LevelFilter::Off, Config::default(), std::io::sink());
        return Ok(());
    }

    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Clear log file if requested
    if config.clear_on_startup {
        let _ = File::create(&config.log_file)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let mut builder = ConfigBuilder::new();
    builder.set_time_format_rfc3339();
    for target in config.features.disabled_targets() {
        builder.add_filter_ignore_str(target);
    }
    let log_config = builder
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    WriteLogger::init(config.level, log_config, log_file)?;

    log::info!("Logging initialized: file={}, level={:?}", config.log_file.display(), config.level);
    log::debug!("Log features: {:?}", config.features);

    Ok(())
}

/// Macro for logging backend calls
#[macro_export]
macro_rules! log_api_call {
    ($($arg:tt)*) => {
        log::debug!(target: $crate::logging::TARGET_API_CALLS, $($arg)*)
    };
}

/// Macro for logging comment thread changes
#[macro_export]
macro_rules! log_comments {
    ($($arg:tt)*) => {
        log::debug!(target: $crate::logging::TARGET_COMMENTS, $($arg)*)
    };
}

/// Macro for general debug logging
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!(target: $crate::logging::TARGET_GENERAL, $($arg)*)
    };
}
