//! Logging utilities for anomaly-guard.
//!
//! The library only emits `tracing` events; it never installs a subscriber.
//! Binaries call [`setup::init_logging`] once at startup.
//!
//! Event levels used by the crate:
//!
//! - `info`: dataset loaded, scan completed
//! - `debug`: per-column skips, scores and findings
//! - `warn`: a detector failed on a column

/// Truncates a string to at most `max_length` bytes, on a character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for binaries.
pub mod setup {
    use tracing::Level;

    /// Configuration for the global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside this crate
        pub level: Level,
        /// Log level for anomaly-guard itself
        pub crate_level: Level,
        /// Whether to emit JSON lines
        pub json_format: bool,
        /// Whether to write to stderr instead of stdout
        pub use_stderr: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: false,
                use_stderr: true,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Debug output for the crate, info for dependencies.
        pub fn verbose() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                ..Self::default()
            }
        }

        /// JSON lines, warnings only.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::WARN,
                json_format: true,
                ..Self::default()
            }
        }

        /// Maps a `-v` count to a preset: 0 is default, 1 is verbose,
        /// 2 or more also traces the crate.
        pub fn from_verbosity(verbosity: u8) -> Self {
            match verbosity {
                0 => Self::default(),
                1 => Self::verbose(),
                _ => Self::verbose().with_crate_level(Level::TRACE),
            }
        }

        /// Sets the log level for dependencies.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for anomaly-guard.
        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},anomaly_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs the global subscriber. `RUST_LOG` takes precedence over the
    /// configured filter when set.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use anomaly_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::verbose().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = match (config.json_format, config.use_stderr) {
            (true, true) => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
            (true, false) => tracing_subscriber::fmt::layer().json().boxed(),
            (false, true) => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed(),
            (false, false) => tracing_subscriber::fmt::layer().boxed(),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;
    use tracing::Level;

    #[test]
    fn test_presets() {
        let config = LoggingConfig::default();
        assert_eq!(config.crate_level, Level::INFO);
        assert!(!config.json_format);

        let config = LoggingConfig::production();
        assert_eq!(config.crate_level, Level::WARN);
        assert!(config.json_format);

        assert_eq!(LoggingConfig::from_verbosity(1).crate_level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_verbosity(5).crate_level, Level::TRACE);
    }

    #[test]
    fn test_env_filter_string() {
        assert_eq!(LoggingConfig::default().env_filter(), "warn,anomaly_guard=info");
        let config = LoggingConfig::default().with_env_filter("anomaly_guard=trace");
        assert_eq!(config.env_filter(), "anomaly_guard=trace");
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        // 'é' is two bytes; cutting inside it backs off to the boundary.
        assert_eq!(truncate_field("héllo", 2), "h...(truncated)");
    }
}
