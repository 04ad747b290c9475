use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::LevelParseError;

/// Severity of a [`LogRecord`](crate::record::LogRecord), ordered from
/// least to most severe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Panic = 4,
}

impl Level {
    /// Every level, in ascending order.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Panic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
        }
    }

    /// Integer code written to the `Level` field of the remote envelope.
    ///
    /// Downstream consumers store and query these exact numbers, so the
    /// table is not ordered by severity and must stay as it is.
    pub fn legacy_code(&self) -> i64 {
        legacy_code(Some(*self))
    }

    /// Map a `tracing` level onto ours. `TRACE` has no counterpart.
    pub fn from_tracing(level: &tracing::Level) -> Option<Level> {
        match *level {
            tracing::Level::ERROR => Some(Level::Error),
            tracing::Level::WARN => Some(Level::Warn),
            tracing::Level::INFO => Some(Level::Info),
            tracing::Level::DEBUG => Some(Level::Debug),
            _ => None,
        }
    }

    /// Closest `tracing` level; `Panic` renders as `ERROR`.
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error | Level::Panic => tracing::Level::ERROR,
        }
    }

    fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            _ => Level::Panic,
        }
    }
}

/// Legacy integer code for an optional level; unknown levels map to 0.
pub fn legacy_code(level: Option<Level>) -> i64 {
    match level {
        Some(Level::Info) => 1,
        Some(Level::Warn) => 3,
        Some(Level::Error) => 4,
        Some(Level::Panic) => 5,
        Some(Level::Debug) => 6,
        None => 0,
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    /// Case-insensitive; the empty string parses as `info`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" | "" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "panic" => Ok(Level::Panic),
            _ => Err(LevelParseError(s.to_string())),
        }
    }
}

/// Minimum-severity threshold shared by every sink of one logger.
///
/// Clones observe the same threshold, so console and remote output can
/// only diverge when they are built with separate gates on purpose.
#[derive(Debug, Clone)]
pub struct LevelGate(Arc<AtomicU8>);

impl LevelGate {
    pub fn new(level: Level) -> Self {
        LevelGate(Arc::new(AtomicU8::new(level as u8)))
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        LevelGate::new(Level::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_codes_are_fixed() {
        assert_eq!(Level::Debug.legacy_code(), 6);
        assert_eq!(Level::Info.legacy_code(), 1);
        assert_eq!(Level::Warn.legacy_code(), 3);
        assert_eq!(Level::Error.legacy_code(), 4);
        assert_eq!(Level::Panic.legacy_code(), 5);
        assert_eq!(legacy_code(None), 0);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARN".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("panic".parse::<Level>(), Ok(Level::Panic));
        assert_eq!("".parse::<Level>(), Ok(Level::Info));
        assert!("verbose".parse::<Level>().is_err());
        assert!("fatal".parse::<Level>().is_err());
    }

    #[test]
    fn all_is_ascending_and_names_round_trip() {
        assert!(Level::ALL.windows(2).all(|w| w[0] < w[1]));
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
            assert_eq!(Level::from_u8(level as u8), level);
        }
        assert_eq!(Level::default(), Level::Info);
    }

    #[test]
    fn gate_is_shared_between_clones() {
        let gate = LevelGate::new(Level::Warn);
        let other = gate.clone();
        assert!(!other.enabled(Level::Info));
        assert!(other.enabled(Level::Error));

        gate.set_level(Level::Debug);
        assert!(other.enabled(Level::Debug));
        assert_eq!(other.level(), Level::Debug);
    }

    #[test]
    fn tracing_trace_has_no_mapping() {
        assert_eq!(Level::from_tracing(&tracing::Level::TRACE), None);
        assert_eq!(Level::from_tracing(&tracing::Level::WARN), Some(Level::Warn));
        assert_eq!(Level::Panic.as_tracing(), tracing::Level::ERROR);
    }
}
