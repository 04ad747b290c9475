use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Environment variable enabling the console sink (`1`, `true`, `yes`, `on`).
pub const LOG_SINK_CONSOLE_ENV: &str = "LOG_SINK_CONSOLE";

/// Environment variable enabling the remote sink.
pub const LOG_SINK_REMOTE_ENV: &str = "LOG_SINK_REMOTE";

/// Environment variable holding the minimum level name.
pub const LOG_SINK_LEVEL_ENV: &str = "LOG_SINK_LEVEL";

/// Which sinks to build and the minimum level they share.
///
/// The delivery callback for the remote sink is not data and is passed
/// next to this struct, never inside it. Remote output only exists when
/// both `remote` is set and a callback is supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub console: bool,
    pub remote: bool,
    /// `debug`, `info`, `warn`, `error` or `panic`. Anything unparsable,
    /// including the empty string, means `info`.
    pub level: String,
}

impl LoggerConfig {
    pub fn console() -> Self {
        LoggerConfig {
            console: true,
            ..Default::default()
        }
    }

    pub fn remote() -> Self {
        LoggerConfig {
            remote: true,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Parsed minimum level, falling back to [`Level::Info`].
    pub fn min_level(&self) -> Level {
        self.level.trim().parse().unwrap_or_default()
    }

    /// Build a config from `LOG_SINK_*` variables. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        LoggerConfig {
            console: lookup(LOG_SINK_CONSOLE_ENV).map(|v| truthy(&v)).unwrap_or(false),
            remote: lookup(LOG_SINK_REMOTE_ENV).map(|v| truthy(&v)).unwrap_or(false),
            level: lookup(LOG_SINK_LEVEL_ENV).unwrap_or_default(),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
